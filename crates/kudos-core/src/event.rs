//! Durable-change notifications.
//!
//! The engine never talks to storage. Every operation that changes something a
//! store would keep pushes a [`LedgerEvent`]; the caller drains them with
//! [`PointEngine::drain_events`](crate::engine::PointEngine::drain_events)
//! after the in-memory state is already committed.

use serde::{Deserialize, Serialize};

use crate::catalog::{AchievementBadge, ActivityKind, MembershipTier};
use crate::engine::ChallengeStatus;
use crate::ledger::RewardRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    UserRegistered {
        user_id: String,
    },
    /// Bookkeeping changed (login streak, social graph, decay cadence) without
    /// a point change.
    ProfileUpdated {
        user_id: String,
    },
    PointsChanged {
        user_id: String,
        before: i64,
        after: i64,
        reason: ActivityKind,
    },
    TierChanged {
        user_id: String,
        from: MembershipTier,
        to: MembershipTier,
        /// Raised by a promotion rather than by points.
        promoted: bool,
    },
    RewardGranted {
        user_id: String,
        reward: RewardRecord,
    },
    BadgeEarned {
        user_id: String,
        badge: AchievementBadge,
    },
    ChallengeJoined {
        user_id: String,
        challenge_id: String,
    },
    ChallengeClosed {
        challenge_id: String,
        status: ChallengeStatus,
    },
}

impl LedgerEvent {
    /// The user whose profile this event touches, if any.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            LedgerEvent::UserRegistered { user_id }
            | LedgerEvent::ProfileUpdated { user_id }
            | LedgerEvent::PointsChanged { user_id, .. }
            | LedgerEvent::TierChanged { user_id, .. }
            | LedgerEvent::RewardGranted { user_id, .. }
            | LedgerEvent::BadgeEarned { user_id, .. }
            | LedgerEvent::ChallengeJoined { user_id, .. } => Some(user_id),
            LedgerEvent::ChallengeClosed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = LedgerEvent::TierChanged {
            user_id: "alice".to_string(),
            from: MembershipTier::Bronze,
            to: MembershipTier::Silver,
            promoted: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "tier_changed");
        assert_eq!(json["user_id"], "alice");

        let back: LedgerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_challenge_closed_has_no_user() {
        let event = LedgerEvent::ChallengeClosed {
            challenge_id: "challenge-00000001".to_string(),
            status: ChallengeStatus::Expired,
        };
        assert_eq!(event.user_id(), None);
        assert_eq!(
            LedgerEvent::ProfileUpdated {
                user_id: "bob".to_string()
            }
            .user_id(),
            Some("bob")
        );
    }
}
