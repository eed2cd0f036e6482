use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{AchievementBadge, ActivityKind, MembershipTier, PointType};

/// One line of a user's append-only activity history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub kind: ActivityKind,
    pub timestamp: DateTime<Utc>,
    /// Points credited (negative for decay and expiry).
    pub points: i64,
    pub details: String,
}

/// A live block of awarded points.
///
/// Expiring entries are dropped by the expiry sweep once their validity
/// period has passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointEntry {
    pub amount: i64,
    pub point_type: PointType,
    pub earned_at: DateTime<Utc>,
}

impl PointEntry {
    pub fn is_expired(&self, now: DateTime<Utc>, validity: chrono::Duration) -> bool {
        self.point_type.expires() && now >= self.earned_at + validity
    }
}

/// A non-point reward (challenge prize, surprise drop).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardRecord {
    pub description: String,
    /// Challenge that granted the reward, if any.
    pub challenge_id: Option<String>,
    pub granted_at: DateTime<Utc>,
}

/// Per-user state owned by the ledger.
///
/// Fields are only writable inside the crate so every change goes through
/// [`Ledger::update`](super::Ledger::update), which keeps the indices in step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub(crate) id: String,
    pub(crate) display_name: String,
    pub(crate) total_points: i64,
    pub(crate) tier: MembershipTier,
    /// Lowest tier the user may hold regardless of points; set by promotions.
    pub(crate) tier_floor: Option<MembershipTier>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) last_login_at: Option<DateTime<Utc>>,
    pub(crate) last_decay_at: Option<DateTime<Utc>>,
    pub(crate) login_streak: u32,
    pub(crate) following: BTreeSet<String>,
    pub(crate) followers: BTreeSet<String>,
    pub(crate) activity_history: Vec<ActivityRecord>,
    pub(crate) point_entries: Vec<PointEntry>,
    pub(crate) earned_badges: BTreeSet<AchievementBadge>,
    pub(crate) participating_challenges: BTreeSet<String>,
    pub(crate) rewards: Vec<RewardRecord>,
    pub(crate) activity_counts: BTreeMap<ActivityKind, u32>,
    pub(crate) trending_posts: u32,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            total_points: 0,
            tier: MembershipTier::Bronze,
            tier_floor: None,
            created_at: now,
            last_login_at: None,
            last_decay_at: Some(now),
            login_streak: 0,
            following: BTreeSet::new(),
            followers: BTreeSet::new(),
            activity_history: Vec::new(),
            point_entries: Vec::new(),
            earned_badges: BTreeSet::new(),
            participating_challenges: BTreeSet::new(),
            rewards: Vec::new(),
            activity_counts: BTreeMap::new(),
            trending_posts: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn total_points(&self) -> i64 {
        self.total_points
    }

    pub fn tier(&self) -> MembershipTier {
        self.tier
    }

    pub fn tier_floor(&self) -> Option<MembershipTier> {
        self.tier_floor
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    pub fn last_decay_at(&self) -> Option<DateTime<Utc>> {
        self.last_decay_at
    }

    pub fn login_streak(&self) -> u32 {
        self.login_streak
    }

    pub fn followers_count(&self) -> usize {
        self.followers.len()
    }

    pub fn following_count(&self) -> usize {
        self.following.len()
    }

    pub fn following(&self) -> &BTreeSet<String> {
        &self.following
    }

    pub fn followers(&self) -> &BTreeSet<String> {
        &self.followers
    }

    pub fn activity_history(&self) -> &[ActivityRecord] {
        &self.activity_history
    }

    pub fn point_entries(&self) -> &[PointEntry] {
        &self.point_entries
    }

    pub fn earned_badges(&self) -> &BTreeSet<AchievementBadge> {
        &self.earned_badges
    }

    pub fn has_badge(&self, badge: AchievementBadge) -> bool {
        self.earned_badges.contains(&badge)
    }

    pub fn participating_challenges(&self) -> &BTreeSet<String> {
        &self.participating_challenges
    }

    pub fn rewards(&self) -> &[RewardRecord] {
        &self.rewards
    }

    /// How many times `kind` has been recorded for this user.
    pub fn activity_count(&self, kind: ActivityKind) -> u32 {
        self.activity_counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn trending_posts(&self) -> u32 {
        self.trending_posts
    }

    /// Tier the profile must hold after its points changed.
    pub(crate) fn derived_tier(&self) -> MembershipTier {
        let by_points = MembershipTier::for_points(self.total_points);
        match self.tier_floor {
            Some(floor) if floor > by_points => floor,
            _ => by_points,
        }
    }

    pub(crate) fn log(&mut self, kind: ActivityKind, at: DateTime<Utc>, points: i64, details: impl Into<String>) {
        self.activity_history.push(ActivityRecord {
            kind,
            timestamp: at,
            points,
            details: details.into(),
        });
    }

    /// Adds `amount` to the total and keeps a live entry for positive awards.
    pub(crate) fn add_points(&mut self, amount: i64, point_type: PointType, at: DateTime<Utc>) {
        self.total_points = self.total_points.saturating_add(amount);
        if amount > 0 && point_type != PointType::None {
            self.point_entries.push(PointEntry {
                amount,
                point_type,
                earned_at: at,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_profile_starts_bronze_with_decay_cadence() {
        let profile = UserProfile::new("u1", "Alice", now());
        assert_eq!(profile.total_points(), 0);
        assert_eq!(profile.tier(), MembershipTier::Bronze);
        assert_eq!(profile.last_decay_at(), Some(now()));
        assert_eq!(profile.followers_count(), 0);
    }

    #[test]
    fn test_derived_tier_respects_floor() {
        let mut profile = UserProfile::new("u1", "Alice", now());
        profile.total_points = 700;
        assert_eq!(profile.derived_tier(), MembershipTier::Silver);

        profile.tier_floor = Some(MembershipTier::Gold);
        assert_eq!(profile.derived_tier(), MembershipTier::Gold);

        profile.total_points = 12_000;
        assert_eq!(profile.derived_tier(), MembershipTier::Platinum);
    }

    #[test]
    fn test_add_points_tracks_entries() {
        let mut profile = UserProfile::new("u1", "Alice", now());
        profile.add_points(50, PointType::Expiring, now());
        profile.add_points(0, PointType::Expiring, now());
        profile.add_points(10, PointType::None, now());
        assert_eq!(profile.total_points(), 60);
        assert_eq!(profile.point_entries().len(), 1);

        let entry = &profile.point_entries()[0];
        assert!(!entry.is_expired(now() + Duration::days(29), Duration::days(30)));
        assert!(entry.is_expired(now() + Duration::days(30), Duration::days(30)));
    }
}
