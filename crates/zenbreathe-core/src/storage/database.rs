//! SQLite-based session storage.
//!
//! Provides persistent storage for:
//! - Completed breathing sessions
//! - Breath-hold test results
//! - Per-exercise target durations
//! - Key-value store for application state

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::data_dir;
use super::migrations;
use crate::breath::validate_duration;
use crate::error::{DatabaseError, Result};

/// Target used for an exercise the user never configured.
pub const DEFAULT_EXERCISE_DURATION_SECS: u64 = 300;

/// One completed breathing session. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub exercise_name: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreathHoldRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Write sink for finished sessions.
pub trait SessionStore {
    fn add_breathing_session(&mut self, exercise_name: &str, duration_ms: u64)
        -> Result<SessionRecord>;
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/zenbreathe/zenbreathe.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("zenbreathe.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Record a completed breathing session.
    pub fn insert_session(&self, exercise_name: &str, duration_ms: u64) -> Result<SessionRecord> {
        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            exercise_name: exercise_name.to_string(),
            duration_ms,
        };
        self.conn.execute(
            "INSERT INTO breathing_sessions (id, timestamp, exercise_name, duration_ms)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id,
                record.timestamp.to_rfc3339(),
                record.exercise_name,
                record.duration_ms as i64,
            ],
        )?;
        Ok(record)
    }

    /// All sessions, oldest first.
    pub fn breathing_sessions(&self) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, exercise_name, duration_ms
             FROM breathing_sessions
             ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, timestamp, exercise_name, duration_ms) = row?;
            let Some(timestamp) = parse_timestamp(&timestamp) else {
                warn!(id = %id, "skipping session with unreadable timestamp");
                continue;
            };
            out.push(SessionRecord {
                id,
                timestamp,
                exercise_name,
                duration_ms: duration_ms.max(0) as u64,
            });
        }
        Ok(out)
    }

    pub fn add_breath_hold_record(&self, duration_ms: u64) -> Result<BreathHoldRecord> {
        let record = BreathHoldRecord {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            duration_ms,
        };
        self.conn.execute(
            "INSERT INTO breath_hold_records (id, timestamp, duration_ms) VALUES (?1, ?2, ?3)",
            params![record.id, record.timestamp.to_rfc3339(), record.duration_ms as i64],
        )?;
        Ok(record)
    }

    /// All breath-hold attempts, oldest first.
    pub fn breath_hold_records(&self) -> Result<Vec<BreathHoldRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, duration_ms FROM breath_hold_records ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, timestamp, duration_ms) = row?;
            let Some(timestamp) = parse_timestamp(&timestamp) else {
                warn!(id = %id, "skipping breath hold with unreadable timestamp");
                continue;
            };
            out.push(BreathHoldRecord {
                id,
                timestamp,
                duration_ms: duration_ms.max(0) as u64,
            });
        }
        Ok(out)
    }

    /// Longest recorded breath hold, in milliseconds.
    pub fn best_breath_hold(&self) -> Result<Option<u64>> {
        let best: Option<i64> = self.conn.query_row(
            "SELECT MAX(duration_ms) FROM breath_hold_records",
            [],
            |row| row.get(0),
        )?;
        Ok(best.map(|ms| ms.max(0) as u64))
    }

    /// Target duration for an exercise, validated. Unset exercises get
    /// [`DEFAULT_EXERCISE_DURATION_SECS`].
    pub fn exercise_duration(&self, exercise_id: &str) -> Result<u64> {
        let result = self.conn.query_row(
            "SELECT duration_secs FROM exercise_durations WHERE exercise_id = ?1",
            params![exercise_id],
            |row| row.get::<_, i64>(0),
        );
        match result {
            Ok(secs) => Ok(validate_duration(Some(secs as f64))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(DEFAULT_EXERCISE_DURATION_SECS),
            Err(e) => Err(e.into()),
        }
    }

    /// Store a target duration. The value is validated first, so an
    /// out-of-range request stores the safe fallback.
    pub fn set_exercise_duration(&self, exercise_id: &str, secs: f64) -> Result<u64> {
        let stored = validate_duration(Some(secs));
        self.conn.execute(
            "INSERT OR REPLACE INTO exercise_durations (exercise_id, duration_secs)
             VALUES (?1, ?2)",
            params![exercise_id, stored as i64],
        )?;
        Ok(stored)
    }

    pub fn exercise_durations(&self) -> Result<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT exercise_id, duration_secs FROM exercise_durations ORDER BY exercise_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, secs) = row?;
            out.push((id, secs.max(0) as u64));
        }
        Ok(out)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl SessionStore for Database {
    fn add_breathing_session(
        &mut self,
        exercise_name: &str,
        duration_ms: u64,
    ) -> Result<SessionRecord> {
        self.insert_session(exercise_name, duration_ms)
    }
}

/// In-memory sink. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: std::sync::Arc<std::sync::Mutex<Vec<SessionRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<SessionRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl SessionStore for MemoryStore {
    fn add_breathing_session(
        &mut self,
        exercise_name: &str,
        duration_ms: u64,
    ) -> Result<SessionRecord> {
        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            exercise_name: exercise_name.to_string(),
            duration_ms,
        };
        self.records
            .lock()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
            .push(record.clone());
        Ok(record)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
