//! Logging setup for binaries and long-running hosts.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (e.g. `"info,draw=debug"`)
/// is used. Fails if a subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| anyhow!("Invalid log filter '{}': {}", default_filter, e))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}
