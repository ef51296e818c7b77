//! Core error types for zenbreathe-core.
//!
//! Nothing in the breathing engine itself fails: invalid input is replaced
//! with safe defaults and platform channels degrade silently. These types
//! cover the edges of the library (pattern parsing, storage, configuration).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for zenbreathe-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Breathing pattern input was rejected
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Could not locate or create the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Breathing pattern input errors.
///
/// A malformed pattern is fatal to the session that was about to start; the
/// caller is expected to send the user back rather than run a broken cycle.
#[derive(Error, Debug)]
pub enum PatternError {
    /// The serialized pattern could not be parsed
    #[error("malformed pattern: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A phase duration is negative, NaN or infinite
    #[error("phase '{phase}' has invalid duration {value}")]
    InvalidDuration { phase: &'static str, value: f64 },

    /// Every phase is zero, so the cycle never advances
    #[error("pattern '{0}' has no phase with a positive duration")]
    EmptyCycle(String),

    /// No preset or custom pattern with this id
    #[error("unknown pattern: {0}")]
    Unknown(String),
}

/// Failures of a best-effort platform channel (speech, vibration, wake lock,
/// ambient audio). These never leave the cue layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The platform has no such capability
    #[error("{0} channel unavailable")]
    Unavailable(&'static str),

    /// The capability exists but the request failed
    #[error("{channel} channel failed: {message}")]
    Failed {
        channel: &'static str,
        message: String,
    },
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_error_wraps_into_core() {
        let err: CoreError = PatternError::EmptyCycle("silent".into()).into();
        assert_eq!(
            err.to_string(),
            "Pattern error: pattern 'silent' has no phase with a positive duration"
        );
    }

    #[test]
    fn sqlite_errors_map_to_query_failed() {
        let err: DatabaseError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }
}
