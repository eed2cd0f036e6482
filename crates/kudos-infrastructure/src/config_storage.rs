//! Engine configuration file.

use std::path::Path;

use kudos_core::EngineConfig;
use kudos_core::error::Result;

use crate::storage::AtomicTomlFile;

/// Reads an [`EngineConfig`] from `path`.
///
/// A missing or empty file yields the defaults. The result is validated.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig> {
    let config = match AtomicTomlFile::<EngineConfig>::new(path).load()? {
        Some(config) => config,
        None => {
            tracing::debug!(target: "config", "No engine config at {}, using defaults", path.display());
            EngineConfig::default()
        }
    };
    config.validate()?;
    Ok(config)
}

/// Validates and writes `config` to `path`.
pub fn save_engine_config(path: &Path, config: &EngineConfig) -> Result<()> {
    config.validate()?;
    AtomicTomlFile::<EngineConfig>::new(path).save(config)?;
    tracing::info!(target: "config", "Saved engine config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_engine_config(&temp_dir.path().join("engine.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_file_and_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine.toml");
        std::fs::write(&path, "power_hour_start = 19\npower_hour_end = 22\n").unwrap();

        let mut config = load_engine_config(&path).unwrap();
        assert_eq!(config.power_hour_start, 19);
        assert_eq!(config.bucket_size, 1000);

        config.rng_seed = Some(5);
        save_engine_config(&path, &config).unwrap();
        assert_eq!(load_engine_config(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine.toml");
        std::fs::write(&path, "bucket_size = 0\n").unwrap();
        assert!(load_engine_config(&path).unwrap_err().is_config());

        let bad = EngineConfig {
            surprise_reward_chance: 2.0,
            ..EngineConfig::default()
        };
        assert!(save_engine_config(&path, &bad).is_err());
    }
}
