use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::breath::{EngineState, Phase};

/// Every state change of a session produces an Event.
/// Front ends render them; the CLI prints them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        pattern_id: String,
        phase: Phase,
        duration_secs: f64,
        at: DateTime<Utc>,
    },
    /// Pre-session countdown numeral.
    CountdownTick {
        remaining: u32,
        at: DateTime<Utc>,
    },
    PhaseEntered {
        phase: Phase,
        duration_secs: f64,
        /// Zero-duration phases passed over on the way.
        skipped: Vec<Phase>,
        at: DateTime<Utc>,
    },
    SessionPaused {
        phase: Phase,
        time_remaining: f64,
        total_elapsed: f64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        phase: Phase,
        time_remaining: f64,
        total_elapsed: f64,
        at: DateTime<Utc>,
    },
    SessionStopped {
        total_elapsed: f64,
        at: DateTime<Utc>,
    },
    /// Target duration reached.
    AutoStopped {
        total_elapsed: f64,
        target_secs: u64,
        at: DateTime<Utc>,
    },
    SessionRecorded {
        exercise_name: String,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: EngineState,
        pattern_id: String,
        cycle_length_secs: f64,
        phase_progress: f64,
        target_secs: Option<u64>,
        session_remaining_secs: Option<f64>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Stable snake_case name, handy for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::SessionStarted { .. } => "session_started",
            Event::CountdownTick { .. } => "countdown_tick",
            Event::PhaseEntered { .. } => "phase_entered",
            Event::SessionPaused { .. } => "session_paused",
            Event::SessionResumed { .. } => "session_resumed",
            Event::SessionStopped { .. } => "session_stopped",
            Event::AutoStopped { .. } => "auto_stopped",
            Event::SessionRecorded { .. } => "session_recorded",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}
