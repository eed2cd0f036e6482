use chrono::{DateTime, Utc};
use strum::IntoEnumIterator;

use super::PointEngine;
use crate::catalog::{AchievementBadge, ActivityKind, Milestone, PointType};
use crate::event::LedgerEvent;
use crate::ledger::UserProfile;

fn reached(profile: &UserProfile, milestone: Milestone) -> bool {
    match milestone {
        Milestone::Activities { kind, count } => profile.activity_count(kind) >= count,
        Milestone::Followers(count) => profile.followers_count() >= count as usize,
        Milestone::LoginStreak(days) => profile.login_streak() >= days,
        Milestone::TrendingPosts(count) => profile.trending_posts() >= count,
    }
}

impl PointEngine {
    /// Grants every badge whose milestone `user_id` has reached and not yet
    /// earned. Each badge pays its bonus as permanent points.
    pub(super) fn check_milestones(&mut self, user_id: &str, now: DateTime<Utc>) -> Vec<AchievementBadge> {
        let Some(profile) = self.ledger.get(user_id) else {
            return Vec::new();
        };
        let earned: Vec<AchievementBadge> = AchievementBadge::iter()
            .filter(|badge| !profile.has_badge(*badge) && reached(profile, badge.spec().milestone))
            .collect();

        for badge in &earned {
            let spec = badge.spec();
            let commit = self.ledger.update(user_id, |profile| {
                profile.earned_badges.insert(*badge);
                profile.add_points(spec.bonus_points, PointType::Permanent, now);
                profile.log(
                    ActivityKind::BadgeEarned,
                    now,
                    spec.bonus_points,
                    format!("Earned badge: {} (+{} points)", spec.name, spec.bonus_points),
                );
            });
            if let Some(commit) = commit {
                self.emit_commit(&commit, ActivityKind::BadgeEarned);
            }
            self.events.push(LedgerEvent::BadgeEarned {
                user_id: user_id.to_string(),
                badge: *badge,
            });
            tracing::info!(target: "badges", "{} earned {}", user_id, spec.name);
        }
        earned
    }
}
