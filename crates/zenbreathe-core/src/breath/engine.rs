//! Breathing phase scheduler.
//!
//! The engine is a wall-clock-based state machine. It does not use internal
//! threads - the caller is responsible for calling `tick()` periodically
//! (every 100ms is plenty for a human breathing cadence).
//!
//! ## Timing
//!
//! Every elapsed value is recomputed from absolute instants read from the
//! [`Clock`]; nothing is accumulated per tick. A throttled or skipped tick
//! therefore delays a phase change but never skews `total_elapsed`.
//!
//! ```text
//! total_elapsed = now - session_start - total_paused
//! phase_elapsed = now - phase_start
//! time_remaining = max(0, phase_budget - phase_elapsed)
//! ```
//!
//! `phase_budget` is the full phase duration on entry and the remaining time
//! after a resume, so resuming continues the current phase instead of
//! restarting it.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = BreathingEngine::new(pattern, Arc::new(SystemClock), cues);
//! engine.start();
//! // In a loop:
//! engine.tick(); // Returns Some(Event::PhaseEntered) on a phase change
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::pattern::BreathingPattern;
use super::phase::{resolve_entry, resolve_next_phase, Phase};
use crate::cues::CueDispatcher;
use crate::events::Event;

/// Observable engine state. Read-only outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub phase: Phase,
    /// Seconds left in the current phase.
    pub time_remaining: f64,
    pub is_running: bool,
    pub is_paused: bool,
    /// Seconds of practice, excluding pauses.
    pub total_elapsed: f64,
}

impl EngineState {
    fn idle(pattern: &BreathingPattern) -> Self {
        Self {
            phase: Phase::Inhale,
            time_remaining: pattern.inhale,
            is_running: false,
            is_paused: false,
            total_elapsed: 0.0,
        }
    }
}

pub struct BreathingEngine {
    pattern: BreathingPattern,
    clock: Arc<dyn Clock>,
    cues: CueDispatcher,
    state: EngineState,
    session_start_ms: u64,
    phase_start_ms: u64,
    /// Seconds owed to the current phase, measured from `phase_start_ms`.
    phase_budget_secs: f64,
    paused_at_ms: Option<u64>,
    total_paused_ms: u64,
}

impl fmt::Debug for BreathingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreathingEngine")
            .field("pattern", &self.pattern.id)
            .field("state", &self.state)
            .field("phase_budget_secs", &self.phase_budget_secs)
            .field("total_paused_ms", &self.total_paused_ms)
            .finish_non_exhaustive()
    }
}

impl BreathingEngine {
    /// Create an idle engine.
    ///
    /// A pattern with no playable phase is replaced by
    /// [`BreathingPattern::fallback`] so the cycle can always advance.
    pub fn new(pattern: BreathingPattern, clock: Arc<dyn Clock>, cues: CueDispatcher) -> Self {
        let pattern = match pattern.validate() {
            Ok(()) => pattern,
            Err(e) => {
                warn!(pattern = %pattern.id, error = %e, "unplayable pattern, using default");
                BreathingPattern::fallback()
            }
        };
        Self {
            state: EngineState::idle(&pattern),
            phase_budget_secs: pattern.inhale,
            pattern,
            clock,
            cues,
            session_start_ms: 0,
            phase_start_ms: 0,
            paused_at_ms: None,
            total_paused_ms: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn pattern(&self) -> &BreathingPattern {
        &self.pattern
    }

    pub fn cycle_length_secs(&self) -> f64 {
        self.pattern.cycle_length_secs()
    }

    /// Running and not paused.
    pub fn is_active(&self) -> bool {
        self.state.is_running && !self.state.is_paused
    }

    pub fn cues(&self) -> &CueDispatcher {
        &self.cues
    }

    pub fn cues_mut(&mut self) -> &mut CueDispatcher {
        &mut self.cues
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self) -> f64 {
        let total = self.pattern.duration(self.state.phase);
        if total <= 0.0 {
            return 0.0;
        }
        (1.0 - self.state.time_remaining / total).clamp(0.0, 1.0)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state.clone(),
            pattern_id: self.pattern.id.clone(),
            cycle_length_secs: self.cycle_length_secs(),
            phase_progress: self.phase_progress(),
            target_secs: None,
            session_remaining_secs: None,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fresh cycle. Restarts from the top when already running.
    pub fn start(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let entry = resolve_entry(&self.pattern, Phase::Inhale)?;

        self.session_start_ms = now;
        self.phase_start_ms = now;
        self.paused_at_ms = None;
        self.total_paused_ms = 0;
        self.phase_budget_secs = entry.duration_secs;
        self.state = EngineState {
            phase: entry.phase,
            time_remaining: entry.duration_secs,
            is_running: true,
            is_paused: false,
            total_elapsed: 0.0,
        };
        self.cues.phase_entered(entry.phase);

        info!(
            pattern = %self.pattern.id,
            phase = entry.phase.as_str(),
            "breathing session started"
        );
        Some(Event::SessionStarted {
            pattern_id: self.pattern.id.clone(),
            phase: entry.phase,
            duration_secs: entry.duration_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.is_active() {
            return None;
        }
        let now = self.clock.now_ms();
        self.flush_elapsed(now);
        self.paused_at_ms = Some(now);
        self.cues.cancel();
        self.state.is_paused = true;

        debug!(total_elapsed = self.state.total_elapsed, "paused");
        Some(Event::SessionPaused {
            phase: self.state.phase,
            time_remaining: self.state.time_remaining,
            total_elapsed: self.state.total_elapsed,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if !self.state.is_running || !self.state.is_paused {
            return None;
        }
        let now = self.clock.now_ms();
        if let Some(paused_at) = self.paused_at_ms.take() {
            self.total_paused_ms += now.saturating_sub(paused_at);
        }
        // Rebase the phase reference; the phase keeps only what it had left.
        self.phase_start_ms = now;
        self.phase_budget_secs = self.state.time_remaining;
        self.state.is_paused = false;

        debug!(total_paused_ms = self.total_paused_ms, "resumed");
        Some(Event::SessionResumed {
            phase: self.state.phase,
            time_remaining: self.state.time_remaining,
            total_elapsed: self.state.total_elapsed,
            at: Utc::now(),
        })
    }

    /// Halt the session. The last phase, remaining time and elapsed time
    /// stay readable.
    pub fn stop(&mut self) -> Option<Event> {
        self.cues.cancel();
        if !self.state.is_running {
            return None;
        }
        if !self.state.is_paused {
            let now = self.clock.now_ms();
            self.flush_elapsed(now);
        }
        self.paused_at_ms = None;
        self.state.is_running = false;
        self.state.is_paused = false;

        info!(total_elapsed = self.state.total_elapsed, "breathing session stopped");
        Some(Event::SessionStopped {
            total_elapsed: self.state.total_elapsed,
            at: Utc::now(),
        })
    }

    /// Call periodically. Returns `Some(Event::PhaseEntered)` when the current
    /// phase runs out.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.is_active() {
            return None;
        }
        let now = self.clock.now_ms();
        self.flush_elapsed(now);
        if self.state.time_remaining <= 0.0 {
            return self.advance(now);
        }
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self, now: u64) {
        let total_ms = now
            .saturating_sub(self.session_start_ms)
            .saturating_sub(self.total_paused_ms);
        let phase_elapsed = now.saturating_sub(self.phase_start_ms) as f64 / 1000.0;
        self.state.total_elapsed = total_ms as f64 / 1000.0;
        self.state.time_remaining = (self.phase_budget_secs - phase_elapsed).max(0.0);
    }

    fn advance(&mut self, now: u64) -> Option<Event> {
        let entry = resolve_next_phase(&self.pattern, self.state.phase)?;

        self.cues.phase_entered(entry.phase);
        self.phase_start_ms = now;
        self.phase_budget_secs = entry.duration_secs;
        self.state.phase = entry.phase;
        self.state.time_remaining = entry.duration_secs;

        debug!(
            phase = entry.phase.as_str(),
            skipped = entry.skipped.len(),
            total_elapsed = self.state.total_elapsed,
            "phase entered"
        );
        Some(Event::PhaseEntered {
            phase: entry.phase,
            duration_secs: entry.duration_secs,
            skipped: entry.skipped,
            at: Utc::now(),
        })
    }
}
