//! Write-behind of engine changes.
//!
//! Writes are collected while the engine lock is held and flushed after it is
//! released. A failed write is logged and counted; the in-memory state is
//! never rolled back and nothing is retried.

use std::collections::BTreeSet;

use kudos_core::catalog::{AchievementBadge, MembershipTier};
use kudos_core::ledger::RewardRecord;
use kudos_core::{LedgerEvent, PointEngine, ProfileRepository, UserRecord};

/// Counts of repository calls made by one or more flushes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub attempted: usize,
    pub failed: usize,
}

impl PersistReport {
    pub fn merge(&mut self, other: PersistReport) {
        self.attempted += other.attempted;
        self.failed += other.failed;
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, operation: &str, user_id: &str, result: kudos_core::Result<()>) {
        self.attempted += 1;
        if let Err(e) = result {
            self.failed += 1;
            tracing::error!(
                target: "persistence",
                "[Persistence] {} for user {} failed: {}",
                operation,
                user_id,
                e
            );
        }
    }
}

/// Repository writes owed for one batch of engine events.
#[derive(Debug, Default)]
pub struct PendingWrites {
    profiles: Vec<UserRecord>,
    tiers: Vec<(String, MembershipTier)>,
    rewards: Vec<(String, RewardRecord)>,
    badges: Vec<(String, AchievementBadge)>,
    memberships: Vec<(String, String)>,
}

impl PendingWrites {
    /// Drains the engine's events and snapshots every touched user.
    pub fn collect(engine: &mut PointEngine) -> Self {
        let mut pending = Self::default();
        let mut touched = BTreeSet::new();

        for event in engine.drain_events() {
            if let Some(user_id) = event.user_id() {
                touched.insert(user_id.to_string());
            }
            match event {
                LedgerEvent::TierChanged {
                    user_id,
                    to,
                    promoted: true,
                    ..
                } => pending.tiers.push((user_id, to)),
                LedgerEvent::RewardGranted { user_id, reward } => pending.rewards.push((user_id, reward)),
                LedgerEvent::BadgeEarned { user_id, badge } => pending.badges.push((user_id, badge)),
                LedgerEvent::ChallengeJoined { user_id, challenge_id } => {
                    pending.memberships.push((user_id, challenge_id))
                }
                LedgerEvent::ChallengeClosed { challenge_id, status } => {
                    tracing::debug!(target: "persistence", "Challenge {} closed as {}", challenge_id, status);
                }
                _ => {}
            }
        }

        pending.profiles = touched
            .iter()
            .filter_map(|user_id| engine.user_record(user_id))
            .collect();
        pending
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
            && self.tiers.is_empty()
            && self.rewards.is_empty()
            && self.badges.is_empty()
            && self.memberships.is_empty()
    }

    /// Applies the writes in order: profile snapshots first so the store
    /// knows every user, then the targeted writes.
    pub async fn flush(self, repository: &dyn ProfileRepository) -> PersistReport {
        let mut report = PersistReport::default();

        for record in &self.profiles {
            report.record("save_profile", &record.id, repository.save_profile(record).await);
        }
        for (user_id, tier) in &self.tiers {
            report.record("save_tier", user_id, repository.save_tier(user_id, *tier).await);
        }
        for (user_id, reward) in &self.rewards {
            report.record("append_reward", user_id, repository.append_reward(user_id, reward).await);
        }
        for (user_id, badge) in &self.badges {
            report.record("append_badge", user_id, repository.append_badge(user_id, *badge).await);
        }
        for (user_id, challenge_id) in &self.memberships {
            report.record(
                "add_challenge_membership",
                user_id,
                repository.add_challenge_membership(user_id, challenge_id).await,
            );
        }

        if !report.is_clean() {
            tracing::warn!(
                target: "persistence",
                "[Persistence] {} of {} writes failed; in-memory state kept",
                report.failed,
                report.attempted
            );
        }
        report
    }
}
