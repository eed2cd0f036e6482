//! Decay cadence and point expiry.

use chrono::{DateTime, Duration, Utc};

use super::PointEngine;
use crate::catalog::ActivityKind;
use crate::ledger::{PointEntry, UserProfile};

/// Decays `profile` if a full interval has passed since its last decay.
///
/// Returns the points removed, or `None` when the interval has not elapsed.
/// A profile that never decayed starts its cadence at `now`.
pub(super) fn decay_profile(profile: &mut UserProfile, now: DateTime<Utc>, interval: Duration) -> Option<i64> {
    let Some(last) = profile.last_decay_at else {
        profile.last_decay_at = Some(now);
        return None;
    };
    if now - last < interval {
        return None;
    }
    let rate = profile.tier.weekly_decay_rate();
    let decayed = profile.tier.decayed(profile.total_points);
    let lost = profile.total_points - decayed;
    profile.total_points = decayed;
    profile.last_decay_at = Some(now);
    profile.log(
        ActivityKind::PointsDecay,
        now,
        -lost,
        format!("Decay of {:.0}% (-{} points)", rate * 100.0, lost),
    );
    Some(lost)
}

/// Drops expired entries and subtracts them from the total.
///
/// Returns the points that lapsed.
fn expire_profile(profile: &mut UserProfile, now: DateTime<Utc>, validity: Duration) -> i64 {
    let (expired, live): (Vec<PointEntry>, Vec<PointEntry>) = std::mem::take(&mut profile.point_entries)
        .into_iter()
        .partition(|entry| entry.is_expired(now, validity));
    profile.point_entries = live;

    let lapsed = expired
        .iter()
        .fold(0i64, |sum, entry| sum.saturating_add(entry.amount));
    if lapsed > 0 {
        profile.total_points = profile.total_points.saturating_sub(lapsed);
        profile.log(
            ActivityKind::PointsExpired,
            now,
            -lapsed,
            format!("{} expiring entries lapsed (-{} points)", expired.len(), lapsed),
        );
    }
    lapsed
}

impl PointEngine {
    fn decay_interval(&self) -> Duration {
        Duration::days(self.config.decay_interval_days)
    }

    /// Decays one user if their interval has elapsed. Returns whether it fired.
    pub fn apply_decay(&mut self, user_id: &str) -> bool {
        let now = self.clock.now();
        let interval = self.decay_interval();
        let mut fired = false;
        let mut started = false;
        let Some(commit) = self.ledger.update(user_id, |profile| {
            started = profile.last_decay_at.is_none();
            fired = decay_profile(profile, now, interval).is_some();
        }) else {
            return false;
        };
        if fired || started {
            self.touched(user_id);
        }
        if fired {
            self.emit_commit(&commit, ActivityKind::PointsDecay);
        }
        fired
    }

    /// Runs the decay check over every user, then rebuilds the leaderboard.
    ///
    /// Returns how many users decayed.
    pub fn apply_weekly_decay(&mut self) -> usize {
        let now = self.clock.now();
        let interval = self.decay_interval();
        let mut decayed_users = Vec::new();
        let mut started_users = Vec::new();
        let commits = self.ledger.sweep(|profile| {
            let started = profile.last_decay_at.is_none();
            if decay_profile(profile, now, interval).is_some() {
                decayed_users.push(profile.id.clone());
            } else if started {
                started_users.push(profile.id.clone());
            }
        });

        for user_id in decayed_users.iter().chain(&started_users) {
            self.touched(user_id);
        }
        for commit in &commits {
            self.emit_commit(commit, ActivityKind::PointsDecay);
        }
        tracing::info!(
            target: "decay",
            "Decay sweep: {} of {} users decayed",
            decayed_users.len(),
            self.ledger.len()
        );
        decayed_users.len()
    }

    /// Removes expiring points older than the validity period.
    ///
    /// Returns how many users lost points.
    pub fn expire_points(&mut self) -> usize {
        let now = self.clock.now();
        let validity = Duration::days(self.config.expiring_validity_days);
        let mut affected = Vec::new();
        let commits = self.ledger.sweep(|profile| {
            if expire_profile(profile, now, validity) > 0 {
                affected.push(profile.id.clone());
            }
        });

        for user_id in &affected {
            self.touched(user_id);
        }
        for commit in &commits {
            self.emit_commit(commit, ActivityKind::PointsExpired);
        }
        tracing::info!(target: "decay", "Expiry sweep: {} users lost points", affected.len());
        affected.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MembershipTier, PointType};
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn profile_with(points: i64) -> UserProfile {
        let mut profile = UserProfile::new("u1", "Alice", start());
        profile.total_points = points;
        profile.tier = MembershipTier::for_points(points);
        profile
    }

    #[test]
    fn test_decay_fires_after_interval_only() {
        let mut profile = profile_with(1000);
        let interval = Duration::days(30);

        assert_eq!(decay_profile(&mut profile, start() + Duration::days(29), interval), None);
        assert_eq!(profile.total_points, 1000);

        assert_eq!(decay_profile(&mut profile, start() + Duration::days(30), interval), Some(50));
        assert_eq!(profile.total_points, 950);
        assert_eq!(profile.last_decay_at, Some(start() + Duration::days(30)));

        // Next cadence starts from the last decay
        assert_eq!(decay_profile(&mut profile, start() + Duration::days(45), interval), None);
        assert_eq!(profile.total_points, 950);
        assert_eq!(profile.activity_history().len(), 1);
    }

    #[test]
    fn test_missing_decay_timestamp_starts_cadence() {
        let mut profile = profile_with(1000);
        profile.last_decay_at = None;
        let now = start() + Duration::days(100);
        assert_eq!(decay_profile(&mut profile, now, Duration::days(30)), None);
        assert_eq!(profile.last_decay_at, Some(now));
        assert_eq!(profile.total_points, 1000);
    }

    #[test]
    fn test_starting_cadence_is_reported_for_persistence() {
        use std::sync::Arc;

        use crate::clock::ManualClock;
        use crate::config::EngineConfig;
        use crate::event::LedgerEvent;

        let now = start() + Duration::days(3);
        let mut engine = PointEngine::with_clock(EngineConfig::default(), Arc::new(ManualClock::new(now))).unwrap();
        for user_id in ["a", "b"] {
            let mut record = crate::repository::UserRecord::from(&profile_with(1000));
            record.id = user_id.to_string();
            record.last_decay_at = None;
            assert!(engine.load_user(record));
        }

        assert!(!engine.apply_decay("a"));
        assert_eq!(engine.user("a").unwrap().last_decay_at, Some(now));
        assert_eq!(
            engine.drain_events(),
            vec![LedgerEvent::ProfileUpdated {
                user_id: "a".to_string()
            }]
        );

        assert_eq!(engine.apply_weekly_decay(), 0);
        assert_eq!(engine.user("b").unwrap().last_decay_at, Some(now));
        assert_eq!(
            engine.drain_events(),
            vec![LedgerEvent::ProfileUpdated {
                user_id: "b".to_string()
            }]
        );
        assert_eq!(engine.user("a").unwrap().total_points(), 1000);
    }

    #[test]
    fn test_expiry_drops_only_old_expiring_entries() {
        let mut profile = profile_with(0);
        profile.add_points(100, PointType::Expiring, start());
        profile.add_points(40, PointType::Permanent, start());
        profile.add_points(20, PointType::Expiring, start() + Duration::days(10));

        let lapsed = expire_profile(&mut profile, start() + Duration::days(30), Duration::days(30));
        assert_eq!(lapsed, 100);
        assert_eq!(profile.total_points, 60);
        assert_eq!(profile.point_entries().len(), 2);
        assert_eq!(profile.activity_history().last().unwrap().kind, ActivityKind::PointsExpired);
    }
}
