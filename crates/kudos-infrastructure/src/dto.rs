//! On-disk document for stored profiles.

use std::collections::BTreeMap;

use kudos_core::catalog::{AchievementBadge, MembershipTier};
use kudos_core::ledger::RewardRecord;
use kudos_core::{KudosError, UserRecord};
use serde::{Deserialize, Serialize};

pub const PROFILE_STORE_VERSION: u32 = 1;

/// Every stored user keyed by id.
///
/// Append operations are idempotent: re-appending a reward, badge or
/// membership that a saved snapshot already carries changes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileStoreDocument {
    pub version: u32,
    #[serde(default)]
    pub users: BTreeMap<String, UserRecord>,
}

impl Default for ProfileStoreDocument {
    fn default() -> Self {
        Self {
            version: PROFILE_STORE_VERSION,
            users: BTreeMap::new(),
        }
    }
}

impl ProfileStoreDocument {
    pub fn upsert(&mut self, record: UserRecord) {
        self.users.insert(record.id.clone(), record);
    }

    pub fn set_tier(&mut self, user_id: &str, tier: MembershipTier) -> Result<(), KudosError> {
        self.user_mut(user_id)?.tier = tier;
        Ok(())
    }

    pub fn append_reward(&mut self, user_id: &str, reward: &RewardRecord) -> Result<(), KudosError> {
        let record = self.user_mut(user_id)?;
        if !record.rewards.contains(reward) {
            record.rewards.push(reward.clone());
        }
        Ok(())
    }

    pub fn append_badge(&mut self, user_id: &str, badge: AchievementBadge) -> Result<(), KudosError> {
        self.user_mut(user_id)?.earned_badges.insert(badge);
        Ok(())
    }

    pub fn add_membership(&mut self, user_id: &str, challenge_id: &str) -> Result<(), KudosError> {
        self.user_mut(user_id)?
            .participating_challenges
            .insert(challenge_id.to_string());
        Ok(())
    }

    fn user_mut(&mut self, user_id: &str) -> Result<&mut UserRecord, KudosError> {
        self.users
            .get_mut(user_id)
            .ok_or_else(|| KudosError::not_found("User", user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use kudos_core::UserProfile;

    fn record(id: &str) -> UserRecord {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        UserRecord::from(&UserProfile::new(id, id, now))
    }

    #[test]
    fn test_appends_are_idempotent() {
        let mut document = ProfileStoreDocument::default();
        document.upsert(record("alice"));
        let reward = RewardRecord {
            description: "Profile Frame".to_string(),
            challenge_id: Some("challenge-1".to_string()),
            granted_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        };

        document.append_reward("alice", &reward).unwrap();
        document.append_reward("alice", &reward).unwrap();
        document.append_badge("alice", AchievementBadge::FirstPost).unwrap();
        document.add_membership("alice", "challenge-1").unwrap();

        let alice = &document.users["alice"];
        assert_eq!(alice.rewards.len(), 1);
        assert!(alice.earned_badges.contains(&AchievementBadge::FirstPost));
        assert!(alice.participating_challenges.contains("challenge-1"));
    }

    #[test]
    fn test_unknown_user_is_not_found() {
        let mut document = ProfileStoreDocument::default();
        let err = document.set_tier("ghost", MembershipTier::Gold).unwrap_err();
        assert!(err.is_not_found());
    }
}
