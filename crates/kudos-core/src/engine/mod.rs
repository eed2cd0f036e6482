//! The scoring and ranking engine.
//!
//! [`PointEngine`] owns the ledger, the point calculator, the trend tracker,
//! challenges and the random source. It is synchronous and single-writer:
//! every mutating operation takes `&mut self` and returns only after the
//! ledger and its indices agree again.
//!
//! Operations are split across submodules by concern:
//! - `decay`: decay cadence and point expiry
//! - `social`: login streaks and the follow graph
//! - `milestones`: achievement badges
//! - `challenge`: collaborative challenges
//! - `draw`: lucky draws, promotions and surprise rewards

mod challenge;
mod decay;
mod draw;
mod milestones;
mod social;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::catalog::{ActivityKind, MembershipTier, PointType};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::event::LedgerEvent;
use crate::ledger::{Commit, Ledger, UserProfile};
use crate::repository::UserRecord;
use crate::scoring::{MultiplierPolicy, PointCalculator, TrendTracker};

pub use challenge::{ChallengeStatus, CollaborativeChallenge, NewChallenge};

pub struct PointEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    ledger: Ledger,
    calculator: PointCalculator,
    trends: TrendTracker,
    multipliers: MultiplierPolicy,
    challenges: BTreeMap<String, CollaborativeChallenge>,
    /// Product id → users who bought it.
    product_buyers: HashMap<String, BTreeSet<String>>,
    events: Vec<LedgerEvent>,
}

impl std::fmt::Debug for PointEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointEngine")
            .field("users", &self.ledger.len())
            .field("challenges", &self.challenges.len())
            .field("pending_events", &self.events.len())
            .finish()
    }
}

impl PointEngine {
    /// Creates an engine on the system clock.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an engine reading time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails validation.
    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            rng,
            ledger: Ledger::new(config.bucket_size),
            calculator: PointCalculator::new(),
            trends: TrendTracker::new(Duration::hours(config.trending_window_hours)),
            multipliers: MultiplierPolicy::from_config(&config),
            challenges: BTreeMap::new(),
            product_buyers: HashMap::new(),
            events: Vec::new(),
            clock,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ============================================================================
    // Users
    // ============================================================================

    /// Creates a Bronze user with zero points.
    ///
    /// Returns `None` if the id is already registered.
    pub fn register_user(&mut self, user_id: &str, display_name: &str) -> Option<&UserProfile> {
        let now = self.clock.now();
        if !self.ledger.insert(UserProfile::new(user_id, display_name, now)) {
            tracing::warn!(target: "engine", "[Engine] User {} already registered", user_id);
            return None;
        }
        tracing::info!(target: "engine", "[Engine] Registered user {}", user_id);
        self.events.push(LedgerEvent::UserRegistered {
            user_id: user_id.to_string(),
        });
        self.ledger.get(user_id)
    }

    /// Restores a stored user without emitting events.
    ///
    /// Returns `false` if the id is already present.
    pub fn load_user(&mut self, record: UserRecord) -> bool {
        let user_id = record.id.clone();
        let loaded = self.ledger.insert(record.into_profile());
        if !loaded {
            tracing::warn!(target: "engine", "[Engine] Skipping duplicate stored user {}", user_id);
        }
        loaded
    }

    pub fn user(&self, user_id: &str) -> Option<&UserProfile> {
        self.ledger.get(user_id)
    }

    /// Current stored form of a user.
    pub fn user_record(&self, user_id: &str) -> Option<UserRecord> {
        self.ledger.get(user_id).map(UserRecord::from)
    }

    // ============================================================================
    // Scoring
    // ============================================================================

    /// Scores one engagement event and credits it to `user_id`.
    ///
    /// `amount` is minutes for video watching and currency units for
    /// monetary kinds. Returns the points credited: 0 for unknown users,
    /// system kinds, zero-value actions and capped repeats.
    pub fn record_activity(&mut self, user_id: &str, item_id: &str, kind: ActivityKind, amount: f64) -> i64 {
        let Some(tier) = self.ledger.get(user_id).map(UserProfile::tier) else {
            tracing::warn!(target: "engine", "[Engine] Activity for unknown user {} ignored", user_id);
            return 0;
        };
        if kind.is_system() {
            tracing::warn!(target: "engine", "[Engine] System activity {} cannot be recorded by callers", kind);
            return 0;
        }

        let now = self.clock.now();
        let base = self.calculator.award(user_id, item_id, kind, amount);
        let trending = self.trends.is_trending(item_id, now);
        let points = self.multipliers.apply(base, tier, trending, now);

        if kind.is_purchase() {
            self.product_buyers
                .entry(item_id.to_string())
                .or_default()
                .insert(user_id.to_string());
        }

        let details = format!("{} on {}", kind.spec().description, item_id);
        let commit = self.ledger.update(user_id, |profile| {
            *profile.activity_counts.entry(kind).or_insert(0) += 1;
            profile.add_points(points, kind.point_type(), now);
            profile.log(kind, now, points, details);
        });
        if let Some(commit) = commit {
            self.emit_commit(&commit, kind);
        }
        tracing::debug!(
            target: "scoring",
            "{} {} on {}: base {} -> {} (tier {}, trending {})",
            user_id,
            kind,
            item_id,
            base,
            points,
            tier,
            trending
        );

        self.check_milestones(user_id, now);
        points
    }

    /// `base` after tier, trending and power hour multipliers, truncated.
    pub fn effective_points(&mut self, base: i64, tier: MembershipTier, item_id: &str) -> i64 {
        let now = self.clock.now();
        let trending = self.trends.is_trending(item_id, now);
        self.multipliers.apply(base, tier, trending, now)
    }

    /// Points a user of `tier` would earn for `kind` on `item_id` right now,
    /// ignoring per-item caps.
    pub fn calculate_post_interaction_points(&mut self, item_id: &str, kind: ActivityKind, tier: MembershipTier) -> i64 {
        self.effective_points(kind.base_points(), tier, item_id)
    }

    /// Clears the per-item comment, tag and watch counters.
    pub fn reset_daily_counters(&mut self) {
        self.calculator.reset_daily();
        tracing::info!(target: "scoring", "Daily counters reset");
    }

    // ============================================================================
    // Trending
    // ============================================================================

    pub fn mark_trending(&mut self, item_id: &str) {
        let now = self.clock.now();
        self.trends.mark(item_id, now);
    }

    /// Marks a post trending and credits its author's trending count.
    ///
    /// The author is only credited when the post was not already trending.
    /// Returns whether the author was credited.
    pub fn mark_post_trending(&mut self, author_id: &str, item_id: &str) -> bool {
        let now = self.clock.now();
        let already_trending = self.trends.is_trending(item_id, now);
        self.trends.mark(item_id, now);
        if already_trending {
            return false;
        }
        let credited = self
            .ledger
            .update(author_id, |profile| profile.trending_posts += 1)
            .is_some();
        if credited {
            self.touched(author_id);
            self.check_milestones(author_id, now);
        }
        credited
    }

    pub fn is_trending(&mut self, item_id: &str) -> bool {
        let now = self.clock.now();
        self.trends.is_trending(item_id, now)
    }

    // ============================================================================
    // Queries
    // ============================================================================

    /// Top `n` users by points, ties by id ascending.
    pub fn top_users(&self, n: usize) -> Vec<&UserProfile> {
        self.ledger.top_n(n)
    }

    pub fn rank_of(&self, user_id: &str) -> Option<usize> {
        self.ledger.rank_of(user_id)
    }

    pub fn users_by_tier(&self, tier: MembershipTier) -> Vec<&UserProfile> {
        self.ledger.users_by_tier(tier)
    }

    /// Bucket-granular candidates for `[min_points, max_points]`; callers
    /// needing exact bounds filter the result.
    pub fn eligible_users(&self, min_points: i64, max_points: i64, tier: Option<MembershipTier>) -> BTreeSet<String> {
        self.ledger.eligible_users(min_points, max_points, tier)
    }

    /// Users who bought `product_id`.
    pub fn buyers_of(&self, product_id: &str) -> Vec<&str> {
        self.product_buyers
            .get(product_id)
            .map(|buyers| buyers.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn verify_indices(&self) -> std::result::Result<(), String> {
        self.ledger.verify_indices()
    }

    /// Takes every event emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // ============================================================================
    // Internal helpers
    // ============================================================================

    /// Adds `amount` points of `point_type` and logs `kind`.
    fn credit(
        &mut self,
        user_id: &str,
        amount: i64,
        point_type: PointType,
        kind: ActivityKind,
        details: String,
        at: DateTime<Utc>,
    ) -> Option<Commit> {
        let commit = self.ledger.update(user_id, |profile| {
            profile.add_points(amount, point_type, at);
            profile.log(kind, at, amount, details);
        })?;
        self.emit_commit(&commit, kind);
        Some(commit)
    }

    fn emit_commit(&mut self, commit: &Commit, reason: ActivityKind) {
        if commit.points_changed() {
            self.events.push(LedgerEvent::PointsChanged {
                user_id: commit.user_id.clone(),
                before: commit.points_before,
                after: commit.points_after,
                reason,
            });
        }
        if commit.tier_changed() {
            tracing::info!(
                target: "engine",
                "[Engine] {} moved from {} to {}",
                commit.user_id,
                commit.tier_before,
                commit.tier_after
            );
            self.events.push(LedgerEvent::TierChanged {
                user_id: commit.user_id.clone(),
                from: commit.tier_before,
                to: commit.tier_after,
                promoted: false,
            });
        }
    }

    fn touched(&mut self, user_id: &str) {
        self.events.push(LedgerEvent::ProfileUpdated {
            user_id: user_id.to_string(),
        });
    }

    /// `at` on the platform's local calendar.
    fn local_date(&self, at: DateTime<Utc>) -> chrono::NaiveDate {
        (at + Duration::minutes(i64::from(self.config.utc_offset_minutes))).date_naive()
    }
}
