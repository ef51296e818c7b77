mod config;
pub mod database;
pub mod migrations;

pub use config::{AmbientConfig, Config, HapticsConfig, SessionConfig, VoiceConfig};
pub use database::{
    BreathHoldRecord, Database, MemoryStore, SessionRecord, SessionStore,
    DEFAULT_EXERCISE_DURATION_SECS,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/zenbreathe[-dev]/` based on ZENBREATHE_ENV.
///
/// Set ZENBREATHE_ENV=dev to use development data directory.
/// ZENBREATHE_HOME replaces the whole path.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("ZENBREATHE_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("ZENBREATHE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("zenbreathe-dev")
            } else {
                base_dir.join("zenbreathe")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
