//! Activity catalog.
//!
//! Static table of every engagement kind the engine understands, with its base
//! award, point type and per-item cap.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Lifecycle of awarded points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum PointType {
    /// Never expires.
    Permanent,
    /// Lapses after the configured validity period (30 days by default).
    Expiring,
    /// Never awarded.
    None,
}

impl PointType {
    pub fn expires(self) -> bool {
        matches!(self, PointType::Expiring)
    }
}

/// How the calculator turns an event into base points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwardPolicy {
    /// Fixed award per call.
    Fixed,
    /// Fixed award, at most `per_item_cap` rewarded calls per (item, user).
    CappedPerItem,
    /// `amount` minutes at `base_points` per minute, cumulative cap per (item, user).
    WatchTime,
    /// `amount` currency units at `base_points` per unit.
    Monetary,
    /// Always zero.
    Zero,
}

/// Catalog row for an [`ActivityKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivitySpec {
    pub id: u32,
    pub base_points: i64,
    pub point_type: PointType,
    pub per_item_cap: i64,
    pub description: &'static str,
}

/// Every kind of engagement event, including the engine's own system entries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    // Content
    Post,
    VideoPost,
    LiveStream,
    Like,
    Comment,
    Share,
    SaveBookmark,
    VideoWatch,
    // User to user
    Follow,
    DirectMessage,
    TagUser,
    CommentReply,
    BeingTagged,
    // Community
    JoinGroup,
    PollParticipation,
    ChallengeParticipation,
    EventRsvp,
    // Commerce
    Purchase,
    InAppPurchase,
    CreatorTip,
    CreatorEarnings,
    // System
    PointsDecay,
    RewardEarned,
    SurpriseDrop,
    BadgeEarned,
    PointsExpired,
}

const fn row(
    id: u32,
    base_points: i64,
    point_type: PointType,
    per_item_cap: i64,
    description: &'static str,
) -> ActivitySpec {
    ActivitySpec {
        id,
        base_points,
        point_type,
        per_item_cap,
        description,
    }
}

impl ActivityKind {
    pub const fn spec(self) -> ActivitySpec {
        use PointType::{Expiring, Permanent};
        match self {
            ActivityKind::Post => row(1, 50, Expiring, 0, "Post content"),
            ActivityKind::VideoPost => row(2, 100, Expiring, 0, "Create a video"),
            ActivityKind::LiveStream => row(3, 150, Expiring, 0, "Live streaming session"),
            ActivityKind::Like => row(4, 0, PointType::None, 0, "Like/React to content"),
            ActivityKind::Comment => row(5, 10, Expiring, 5, "Comment on content"),
            ActivityKind::Share => row(6, 25, Expiring, 0, "Share/Repost content"),
            ActivityKind::SaveBookmark => row(7, 0, PointType::None, 0, "Save/Bookmark content"),
            ActivityKind::VideoWatch => row(8, 5, Expiring, 50, "Watch video (per minute)"),
            ActivityKind::Follow => row(9, 0, PointType::None, 0, "Follow a user"),
            ActivityKind::DirectMessage => row(10, 0, PointType::None, 0, "Send direct message"),
            ActivityKind::TagUser => row(11, 10, Expiring, 3, "Tag user in post"),
            ActivityKind::CommentReply => row(12, 10, Expiring, 0, "Reply to comment"),
            ActivityKind::BeingTagged => row(13, 10, Expiring, 0, "Being tagged in post"),
            ActivityKind::JoinGroup => row(14, 50, Expiring, 0, "Join a group/community"),
            ActivityKind::PollParticipation => row(15, 10, Expiring, 0, "Participate in poll"),
            ActivityKind::ChallengeParticipation => {
                row(16, 100, Expiring, 0, "Participate in challenge")
            }
            ActivityKind::EventRsvp => row(17, 50, Expiring, 0, "RSVP to event"),
            ActivityKind::Purchase => row(18, 1, Permanent, 0, "Buy product (per $1)"),
            ActivityKind::InAppPurchase => row(19, 1, Permanent, 0, "Make in-app purchase (per $1)"),
            ActivityKind::CreatorTip => row(20, 5, Permanent, 0, "Tip creator (per $1)"),
            ActivityKind::CreatorEarnings => row(21, 10, Permanent, 0, "Earn from content (per $1)"),
            ActivityKind::PointsDecay => row(22, 0, PointType::None, 0, "Points decay"),
            ActivityKind::RewardEarned => row(23, 0, Permanent, 0, "Reward earned"),
            ActivityKind::SurpriseDrop => row(24, 0, Expiring, 0, "Surprise drop"),
            ActivityKind::BadgeEarned => row(25, 0, Permanent, 0, "Badge earned"),
            ActivityKind::PointsExpired => row(26, 0, PointType::None, 0, "Expiring points lapsed"),
        }
    }

    pub const fn id(self) -> u32 {
        self.spec().id
    }

    pub const fn base_points(self) -> i64 {
        self.spec().base_points
    }

    pub const fn point_type(self) -> PointType {
        self.spec().point_type
    }

    pub const fn per_item_cap(self) -> i64 {
        self.spec().per_item_cap
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::iter().find(|kind| kind.id() == id)
    }

    pub fn policy(self) -> AwardPolicy {
        match self {
            ActivityKind::Comment | ActivityKind::TagUser => AwardPolicy::CappedPerItem,
            ActivityKind::VideoWatch => AwardPolicy::WatchTime,
            ActivityKind::Purchase
            | ActivityKind::InAppPurchase
            | ActivityKind::CreatorTip
            | ActivityKind::CreatorEarnings => AwardPolicy::Monetary,
            kind if kind.is_system() || kind.point_type() == PointType::None => AwardPolicy::Zero,
            _ => AwardPolicy::Fixed,
        }
    }

    /// Entries the engine writes itself; callers never earn points through them.
    pub fn is_system(self) -> bool {
        matches!(
            self,
            ActivityKind::PointsDecay
                | ActivityKind::RewardEarned
                | ActivityKind::SurpriseDrop
                | ActivityKind::BadgeEarned
                | ActivityKind::PointsExpired
        )
    }

    /// Purchases register the actor as a buyer of the item.
    pub fn is_purchase(self) -> bool {
        matches!(self, ActivityKind::Purchase | ActivityKind::InAppPurchase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique_and_resolvable() {
        let ids: HashSet<u32> = ActivityKind::iter().map(ActivityKind::id).collect();
        assert_eq!(ids.len(), ActivityKind::iter().count());
        for kind in ActivityKind::iter() {
            assert_eq!(ActivityKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(ActivityKind::from_id(999), None);
    }

    #[test]
    fn test_policies() {
        assert_eq!(ActivityKind::Comment.policy(), AwardPolicy::CappedPerItem);
        assert_eq!(ActivityKind::VideoWatch.policy(), AwardPolicy::WatchTime);
        assert_eq!(ActivityKind::CreatorTip.policy(), AwardPolicy::Monetary);
        assert_eq!(ActivityKind::Like.policy(), AwardPolicy::Zero);
        assert_eq!(ActivityKind::SurpriseDrop.policy(), AwardPolicy::Zero);
        assert_eq!(ActivityKind::LiveStream.policy(), AwardPolicy::Fixed);
    }

    #[test]
    fn test_monetary_kinds_are_permanent() {
        for kind in ActivityKind::iter().filter(|k| k.policy() == AwardPolicy::Monetary) {
            assert_eq!(kind.point_type(), PointType::Permanent);
        }
    }
}
