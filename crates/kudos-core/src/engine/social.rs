//! Login streaks and the follow graph.

use chrono::Duration;

use super::PointEngine;
use super::decay::decay_profile;
use crate::catalog::ActivityKind;

impl PointEngine {
    /// Records a login and runs the user's decay check.
    ///
    /// A login on the calendar day after the previous one extends the streak,
    /// a second login on the same day leaves it alone, anything else restarts
    /// it at 1. Returns `false` for an unknown user.
    pub fn record_login(&mut self, user_id: &str) -> bool {
        let now = self.clock.now();
        let today = self.local_date(now);
        let previous = match self.ledger.get(user_id) {
            Some(profile) => profile.last_login_at.map(|at| self.local_date(at)),
            None => return false,
        };
        let interval = Duration::days(self.config.decay_interval_days);

        let Some(commit) = self.ledger.update(user_id, |profile| {
            profile.login_streak = match previous {
                Some(day) if day == today => profile.login_streak.max(1),
                Some(day) if day.succ_opt() == Some(today) => profile.login_streak + 1,
                _ => 1,
            };
            profile.last_login_at = Some(now);
            decay_profile(profile, now, interval);
        }) else {
            return false;
        };

        tracing::debug!(target: "engine", "[Engine] {} logged in", user_id);
        self.touched(user_id);
        self.emit_commit(&commit, ActivityKind::PointsDecay);
        self.check_milestones(user_id, now);
        true
    }

    /// `follower_id` starts following `followee_id`.
    ///
    /// Returns `false` for unknown users, self-follows and existing follows.
    pub fn follow(&mut self, follower_id: &str, followee_id: &str) -> bool {
        if follower_id == followee_id
            || !self.ledger.contains(followee_id)
            || self
                .ledger
                .get(follower_id)
                .is_none_or(|profile| profile.following.contains(followee_id))
        {
            return false;
        }

        let now = self.clock.now();
        let details = format!("Followed {followee_id}");
        self.ledger.update(follower_id, |profile| {
            profile.following.insert(followee_id.to_string());
            *profile.activity_counts.entry(ActivityKind::Follow).or_insert(0) += 1;
            profile.log(ActivityKind::Follow, now, 0, details);
        });
        self.ledger.update(followee_id, |profile| {
            profile.followers.insert(follower_id.to_string());
        });

        self.touched(follower_id);
        self.touched(followee_id);
        self.check_milestones(follower_id, now);
        self.check_milestones(followee_id, now);
        true
    }

    /// Returns `false` unless `follower_id` was following `followee_id`.
    pub fn unfollow(&mut self, follower_id: &str, followee_id: &str) -> bool {
        let follows = self
            .ledger
            .get(follower_id)
            .is_some_and(|profile| profile.following.contains(followee_id));
        if !follows {
            return false;
        }
        self.ledger.update(follower_id, |profile| {
            profile.following.remove(followee_id);
        });
        self.ledger.update(followee_id, |profile| {
            profile.followers.remove(follower_id);
        });
        self.touched(follower_id);
        self.touched(followee_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use crate::clock::ManualClock;
    use crate::config::EngineConfig;
    use crate::engine::PointEngine;

    fn engine() -> (PointEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()));
        let engine = PointEngine::with_clock(EngineConfig::default(), clock.clone()).unwrap();
        (engine, clock)
    }

    #[test]
    fn test_login_streak_rules() {
        let (mut engine, clock) = engine();
        engine.register_user("alice", "Alice");

        assert!(engine.record_login("alice"));
        assert_eq!(engine.user("alice").unwrap().login_streak(), 1);

        clock.advance(chrono::Duration::hours(3));
        engine.record_login("alice");
        assert_eq!(engine.user("alice").unwrap().login_streak(), 1);

        clock.advance(chrono::Duration::days(1));
        engine.record_login("alice");
        assert_eq!(engine.user("alice").unwrap().login_streak(), 2);

        clock.advance(chrono::Duration::days(2));
        engine.record_login("alice");
        assert_eq!(engine.user("alice").unwrap().login_streak(), 1);

        assert!(!engine.record_login("ghost"));
    }

    #[test]
    fn test_login_runs_decay_check() {
        let (mut engine, clock) = engine();
        engine.register_user("alice", "Alice");
        engine.record_activity("alice", "sku", crate::catalog::ActivityKind::Purchase, 1000.0);
        let before = engine.user("alice").unwrap().total_points();

        clock.advance(chrono::Duration::days(30));
        engine.record_login("alice");
        assert!(engine.user("alice").unwrap().total_points() < before);
        assert!(engine.verify_indices().is_ok());
    }

    #[test]
    fn test_follow_and_unfollow() {
        let (mut engine, _) = engine();
        engine.register_user("alice", "Alice");
        engine.register_user("bob", "Bob");

        assert!(engine.follow("alice", "bob"));
        assert!(!engine.follow("alice", "bob"));
        assert!(!engine.follow("alice", "alice"));
        assert!(!engine.follow("alice", "ghost"));
        assert_eq!(engine.user("bob").unwrap().followers_count(), 1);
        assert_eq!(engine.user("alice").unwrap().following_count(), 1);
        assert_eq!(engine.user("alice").unwrap().total_points(), 0);

        assert!(engine.unfollow("alice", "bob"));
        assert!(!engine.unfollow("alice", "bob"));
        assert_eq!(engine.user("bob").unwrap().followers_count(), 0);
    }
}
