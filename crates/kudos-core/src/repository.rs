//! Durable storage port.
//!
//! The engine is purely in-memory. A [`ProfileRepository`] receives the
//! changes the application drains from the engine and hands back stored
//! records at startup.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{AchievementBadge, ActivityKind, MembershipTier};
use crate::error::Result;
use crate::ledger::{PointEntry, RewardRecord, UserProfile};

/// Stored form of a [`UserProfile`].
///
/// Activity history is not persisted; reward and badge history are appended
/// through their own repository calls and folded back in on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub display_name: String,
    pub total_points: i64,
    pub tier: MembershipTier,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_decay_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub login_streak: u32,
    #[serde(default)]
    pub following: BTreeSet<String>,
    #[serde(default)]
    pub followers: BTreeSet<String>,
    #[serde(default)]
    pub point_entries: Vec<PointEntry>,
    #[serde(default)]
    pub earned_badges: BTreeSet<AchievementBadge>,
    #[serde(default)]
    pub participating_challenges: BTreeSet<String>,
    #[serde(default)]
    pub rewards: Vec<RewardRecord>,
    #[serde(default)]
    pub activity_counts: BTreeMap<ActivityKind, u32>,
    #[serde(default)]
    pub trending_posts: u32,
}

impl From<&UserProfile> for UserRecord {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.clone(),
            display_name: profile.display_name.clone(),
            total_points: profile.total_points,
            tier: profile.tier,
            created_at: profile.created_at,
            last_login_at: profile.last_login_at,
            last_decay_at: profile.last_decay_at,
            login_streak: profile.login_streak,
            following: profile.following.clone(),
            followers: profile.followers.clone(),
            point_entries: profile.point_entries.clone(),
            earned_badges: profile.earned_badges.clone(),
            participating_challenges: profile.participating_challenges.clone(),
            rewards: profile.rewards.clone(),
            activity_counts: profile.activity_counts.clone(),
            trending_posts: profile.trending_posts,
        }
    }
}

impl UserRecord {
    /// Rebuilds a profile.
    ///
    /// A stored tier above the one the points justify is kept as the tier
    /// floor, so promotions survive a restart.
    pub fn into_profile(self) -> UserProfile {
        let total_points = self.total_points.max(0);
        let by_points = MembershipTier::for_points(total_points);
        let mut profile = UserProfile::new(self.id, self.display_name, self.created_at);
        profile.total_points = total_points;
        profile.tier = self.tier;
        profile.tier_floor = (self.tier > by_points).then_some(self.tier);
        profile.last_login_at = self.last_login_at;
        profile.last_decay_at = self.last_decay_at;
        profile.login_streak = self.login_streak;
        profile.following = self.following;
        profile.followers = self.followers;
        profile.point_entries = self.point_entries;
        profile.earned_badges = self.earned_badges;
        profile.participating_challenges = self.participating_challenges;
        profile.rewards = self.rewards;
        profile.activity_counts = self.activity_counts;
        profile.trending_posts = self.trending_posts;
        profile
    }
}

/// An abstract repository for persisting user profiles and their history.
///
/// Every write is best-effort from the engine's point of view: callers log
/// failures and never roll the in-memory state back.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Loads every stored user.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<UserRecord>)`: All stored users (empty for a fresh store)
    /// - `Err(_)`: The store could not be read
    async fn load_all(&self) -> Result<Vec<UserRecord>>;

    /// Inserts or replaces a user record.
    async fn save_profile(&self, record: &UserRecord) -> Result<()>;

    /// Updates only the stored tier of a user.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Tier written
    /// - `Err(_)`: Write failed, or the user is unknown to the store
    async fn save_tier(&self, user_id: &str, tier: MembershipTier) -> Result<()>;

    /// Appends to a user's reward history.
    async fn append_reward(&self, user_id: &str, reward: &RewardRecord) -> Result<()>;

    /// Records that a user earned a badge.
    async fn append_badge(&self, user_id: &str, badge: AchievementBadge) -> Result<()>;

    /// Records that a user joined a challenge.
    async fn add_challenge_membership(&self, user_id: &str, challenge_id: &str) -> Result<()>;
}
