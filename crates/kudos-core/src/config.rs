//! Engine configuration model.
//!
//! Loaded from TOML by the infrastructure layer. Every field has a default so a
//! partial (or empty) file is valid.

use serde::{Deserialize, Serialize};

use crate::error::{KudosError, Result};

/// Width of a point bucket in the secondary index.
pub const DEFAULT_BUCKET_SIZE: i64 = 1000;

/// Tunables for scoring, decay and random events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Width of a point-range bucket.
    pub bucket_size: i64,
    /// Multiplier for awards on trending items.
    pub trending_multiplier: f64,
    /// How long an item stays trending after it is marked.
    pub trending_window_hours: i64,
    /// First hour (inclusive) of the daily power hour window.
    pub power_hour_start: u32,
    /// Last hour (exclusive) of the daily power hour window.
    pub power_hour_end: u32,
    pub power_hour_multiplier: f64,
    /// Offset applied to UTC before reading the hour of day.
    pub utc_offset_minutes: i32,
    /// Minimum days between two decays of the same user.
    pub decay_interval_days: i64,
    /// Lifetime of expiring points.
    pub expiring_validity_days: i64,
    /// Per-user probability of a surprise reward.
    pub surprise_reward_chance: f64,
    /// Per-user probability of a random bonus during peak hours.
    pub bonus_chance_peak: f64,
    /// Per-user probability of a random bonus during off-peak hours.
    pub bonus_chance_off_peak: f64,
    /// Off-peak window start hour; the window wraps past midnight.
    pub off_peak_start: u32,
    pub off_peak_end: u32,
    /// Seed for draws and surprise events. `None` seeds from entropy.
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE,
            trending_multiplier: 3.0,
            trending_window_hours: 24,
            power_hour_start: 18,
            power_hour_end: 21,
            power_hour_multiplier: 2.0,
            utc_offset_minutes: 0,
            decay_interval_days: 30,
            expiring_validity_days: 30,
            surprise_reward_chance: 0.05,
            bonus_chance_peak: 0.05,
            bonus_chance_off_peak: 0.15,
            off_peak_start: 23,
            off_peak_end: 6,
            rng_seed: None,
        }
    }
}

/// Longest window or interval accepted, about ten years.
const MAX_WINDOW_DAYS: i64 = 3_650;
const MAX_MULTIPLIER: f64 = 100.0;
const MAX_UTC_OFFSET_MINUTES: u32 = 14 * 60;

impl EngineConfig {
    /// Rejects values the engine cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.bucket_size <= 0 {
            return Err(KudosError::config(format!(
                "bucket_size must be positive, got {}",
                self.bucket_size
            )));
        }
        for (name, hour) in [
            ("power_hour_start", self.power_hour_start),
            ("power_hour_end", self.power_hour_end),
            ("off_peak_start", self.off_peak_start),
            ("off_peak_end", self.off_peak_end),
        ] {
            if hour > 23 {
                return Err(KudosError::config(format!("{name} must be an hour of day, got {hour}")));
            }
        }
        if self.power_hour_start >= self.power_hour_end {
            return Err(KudosError::config("power hour window must not wrap past midnight"));
        }
        for (name, multiplier) in [
            ("trending_multiplier", self.trending_multiplier),
            ("power_hour_multiplier", self.power_hour_multiplier),
        ] {
            if !(1.0..=MAX_MULTIPLIER).contains(&multiplier) {
                return Err(KudosError::config(format!(
                    "{name} must be within [1, {MAX_MULTIPLIER}], got {multiplier}"
                )));
            }
        }
        for (name, chance) in [
            ("surprise_reward_chance", self.surprise_reward_chance),
            ("bonus_chance_peak", self.bonus_chance_peak),
            ("bonus_chance_off_peak", self.bonus_chance_off_peak),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(KudosError::config(format!("{name} must be within [0, 1], got {chance}")));
            }
        }
        for (name, value, limit) in [
            ("trending_window_hours", self.trending_window_hours, MAX_WINDOW_DAYS * 24),
            ("decay_interval_days", self.decay_interval_days, MAX_WINDOW_DAYS),
            ("expiring_validity_days", self.expiring_validity_days, MAX_WINDOW_DAYS),
        ] {
            if value <= 0 || value > limit {
                return Err(KudosError::config(format!(
                    "{name} must be within [1, {limit}], got {value}"
                )));
            }
        }
        if self.utc_offset_minutes.unsigned_abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(KudosError::config(format!(
                "utc_offset_minutes must be within +/-{MAX_UTC_OFFSET_MINUTES}, got {}",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str("bucket_size = 500\nrng_seed = 7").unwrap();
        assert_eq!(config.bucket_size, 500);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.power_hour_start, 18);
        assert_eq!(config.trending_multiplier, 3.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = EngineConfig {
            bucket_size: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().unwrap_err().is_config());

        let config = EngineConfig {
            power_hour_start: 21,
            power_hour_end: 18,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            bonus_chance_peak: 1.5,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_windows_too_large_for_durations() {
        for config in [
            EngineConfig {
                trending_window_hours: i64::MAX,
                ..EngineConfig::default()
            },
            EngineConfig {
                decay_interval_days: i64::MAX / 2,
                ..EngineConfig::default()
            },
            EngineConfig {
                expiring_validity_days: 3_651,
                ..EngineConfig::default()
            },
            EngineConfig {
                trending_multiplier: 1.0e12,
                ..EngineConfig::default()
            },
            EngineConfig {
                utc_offset_minutes: i32::MIN,
                ..EngineConfig::default()
            },
        ] {
            assert!(config.validate().unwrap_err().is_config());
        }

        let config = EngineConfig {
            decay_interval_days: 3_650,
            trending_window_hours: 24 * 3_650,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
