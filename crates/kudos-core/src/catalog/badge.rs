//! Achievement badges and the milestones that unlock them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use super::activity::ActivityKind;

/// What a user must reach to earn a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    /// Recorded `count` activities of `kind`.
    Activities { kind: ActivityKind, count: u32 },
    Followers(u32),
    LoginStreak(u32),
    TrendingPosts(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeSpec {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    /// Permanent points credited when the badge is earned.
    pub bonus_points: i64,
    pub milestone: Milestone,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum AchievementBadge {
    FirstPost,
    ContentCreator,
    VideoStar,
    SocialButterfly,
    EngagementKing,
    LoyalUser,
    TrendingMaker,
    SuperCommenter,
}

impl AchievementBadge {
    pub const fn spec(self) -> BadgeSpec {
        match self {
            AchievementBadge::FirstPost => BadgeSpec {
                id: 1,
                name: "First Post",
                description: "Created your first post",
                bonus_points: 50,
                milestone: Milestone::Activities {
                    kind: ActivityKind::Post,
                    count: 1,
                },
            },
            AchievementBadge::ContentCreator => BadgeSpec {
                id: 2,
                name: "Content Creator",
                description: "Created 50 posts",
                bonus_points: 100,
                milestone: Milestone::Activities {
                    kind: ActivityKind::Post,
                    count: 50,
                },
            },
            AchievementBadge::VideoStar => BadgeSpec {
                id: 3,
                name: "Video Star",
                description: "Created 20 video posts",
                bonus_points: 150,
                milestone: Milestone::Activities {
                    kind: ActivityKind::VideoPost,
                    count: 20,
                },
            },
            AchievementBadge::SocialButterfly => BadgeSpec {
                id: 4,
                name: "Social Butterfly",
                description: "Reached 100 followers",
                bonus_points: 200,
                milestone: Milestone::Followers(100),
            },
            AchievementBadge::EngagementKing => BadgeSpec {
                id: 5,
                name: "Engagement King",
                description: "Left 500 likes",
                bonus_points: 250,
                milestone: Milestone::Activities {
                    kind: ActivityKind::Like,
                    count: 500,
                },
            },
            AchievementBadge::LoyalUser => BadgeSpec {
                id: 6,
                name: "Loyal User",
                description: "Logged in for 30 consecutive days",
                bonus_points: 300,
                milestone: Milestone::LoginStreak(30),
            },
            AchievementBadge::TrendingMaker => BadgeSpec {
                id: 7,
                name: "Trending Maker",
                description: "Had 5 posts trending",
                bonus_points: 400,
                milestone: Milestone::TrendingPosts(5),
            },
            AchievementBadge::SuperCommenter => BadgeSpec {
                id: 8,
                name: "Super Commenter",
                description: "Left 200 comments",
                bonus_points: 150,
                milestone: Milestone::Activities {
                    kind: ActivityKind::Comment,
                    count: 200,
                },
            },
        }
    }

    pub const fn bonus_points(self) -> i64 {
        self.spec().bonus_points
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::iter().find(|badge| badge.spec().id == id)
    }
}
