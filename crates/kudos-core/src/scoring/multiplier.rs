//! Compound multiplier pipeline: tier x trending x power hour.

use chrono::{DateTime, Duration, Timelike, Utc};

use crate::catalog::{MembershipTier, scale_ratio};
use crate::config::EngineConfig;

fn to_percent(multiplier: f64) -> i64 {
    (multiplier * 100.0).round() as i64
}

/// Multiplier rules read from [`EngineConfig`].
///
/// Factors are held in percent so the final truncation happens on integers.
#[derive(Debug, Clone)]
pub struct MultiplierPolicy {
    trending_percent: i64,
    power_hour_percent: i64,
    power_hour_start: u32,
    power_hour_end: u32,
    utc_offset: Duration,
}

impl MultiplierPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            trending_percent: to_percent(config.trending_multiplier),
            power_hour_percent: to_percent(config.power_hour_multiplier),
            power_hour_start: config.power_hour_start,
            power_hour_end: config.power_hour_end,
            utc_offset: Duration::minutes(i64::from(config.utc_offset_minutes)),
        }
    }

    /// Hour of day on the platform's local clock.
    pub fn local_hour(&self, now: DateTime<Utc>) -> u32 {
        (now + self.utc_offset).hour()
    }

    /// Whether `now` falls inside `[start, end)`.
    pub fn is_power_hour(&self, now: DateTime<Utc>) -> bool {
        let hour = self.local_hour(now);
        hour >= self.power_hour_start && hour < self.power_hour_end
    }

    pub fn compound_multiplier(&self, tier: MembershipTier, trending: bool, now: DateTime<Utc>) -> f64 {
        let (numerator, denominator) = self.compound_ratio(tier, trending, now);
        numerator as f64 / denominator as f64
    }

    /// `floor(base * tier * trending * power hour)`, saturating at `i64::MAX`.
    pub fn apply(&self, base: i64, tier: MembershipTier, trending: bool, now: DateTime<Utc>) -> i64 {
        let (numerator, denominator) = self.compound_ratio(tier, trending, now);
        scale_ratio(base, numerator, denominator)
    }

    fn compound_ratio(&self, tier: MembershipTier, trending: bool, now: DateTime<Utc>) -> (i64, i64) {
        let trending = if trending { self.trending_percent } else { 100 };
        let power_hour = if self.is_power_hour(now) {
            self.power_hour_percent
        } else {
            100
        };
        (tier.multiplier_percent() * trending * power_hour, 100 * 100 * 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_stacking_is_multiplicative() {
        let policy = MultiplierPolicy::from_config(&EngineConfig::default());
        assert_eq!(policy.apply(50, MembershipTier::Gold, true, at(19, 0)), 450);
        assert_eq!(policy.compound_multiplier(MembershipTier::Gold, true, at(19, 0)), 9.0);
        assert_eq!(policy.apply(50, MembershipTier::Gold, false, at(12, 0)), 75);
        assert_eq!(policy.apply(50, MembershipTier::Bronze, true, at(12, 0)), 150);
    }

    #[test]
    fn test_power_hour_window_is_half_open() {
        let policy = MultiplierPolicy::from_config(&EngineConfig::default());
        assert!(!policy.is_power_hour(at(17, 59)));
        assert!(policy.is_power_hour(at(18, 0)));
        assert!(policy.is_power_hour(at(20, 59)));
        assert!(!policy.is_power_hour(at(21, 0)));
    }

    #[test]
    fn test_truncates_fractional_points() {
        let policy = MultiplierPolicy::from_config(&EngineConfig::default());
        // 7 * 1.2 = 8.4
        assert_eq!(policy.apply(7, MembershipTier::Silver, false, at(9, 0)), 8);
    }

    #[test]
    fn test_large_base_saturates_instead_of_overflowing() {
        let policy = MultiplierPolicy::from_config(&EngineConfig::default());
        let base = 10_000_000_000_000;
        assert_eq!(policy.apply(base, MembershipTier::Bronze, false, at(9, 0)), base);
        assert_eq!(policy.apply(base, MembershipTier::Platinum, true, at(19, 0)), base * 12);
        assert_eq!(policy.apply(i64::MAX, MembershipTier::Gold, false, at(9, 0)), i64::MAX);
    }

    #[test]
    fn test_utc_offset_shifts_power_hour() {
        let config = EngineConfig {
            utc_offset_minutes: 9 * 60,
            ..EngineConfig::default()
        };
        let policy = MultiplierPolicy::from_config(&config);
        // 10:00 UTC is 19:00 at +09:00
        assert!(policy.is_power_hour(at(10, 0)));
        assert!(!policy.is_power_hour(at(19, 0)));
    }
}
