//! Auto-stop guard.
//!
//! Watches cumulative elapsed time against the session target and fires once.
//! Sessions longer than a minute must also have run for a few seconds, so a
//! target supplied in the wrong unit cannot end the session instantly.

use serde::{Deserialize, Serialize};

use super::engine::EngineState;

/// Targets above this many seconds require [`MIN_ELAPSED_SECS`] of practice.
pub const LONG_SESSION_THRESHOLD_SECS: f64 = 60.0;
pub const MIN_ELAPSED_SECS: f64 = 5.0;

pub fn should_allow_auto_stop(elapsed_secs: f64, target_secs: f64) -> bool {
    if target_secs > LONG_SESSION_THRESHOLD_SECS && elapsed_secs < MIN_ELAPSED_SECS {
        return false;
    }
    elapsed_secs >= target_secs
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoStopGuard {
    target_secs: u64,
    fired: bool,
}

impl AutoStopGuard {
    pub fn new(target_secs: u64) -> Self {
        Self {
            target_secs,
            fired: false,
        }
    }

    pub fn target_secs(&self) -> u64 {
        self.target_secs
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Re-arm for a new session.
    pub fn reset(&mut self) {
        self.fired = false;
    }

    /// Returns true exactly once, on the first observation where the session
    /// should end.
    pub fn observe(&mut self, state: &EngineState) -> bool {
        if self.fired || !state.is_running || state.is_paused || self.target_secs == 0 {
            return false;
        }
        if should_allow_auto_stop(state.total_elapsed, self.target_secs as f64) {
            self.fired = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breath::Phase;

    fn running(total_elapsed: f64) -> EngineState {
        EngineState {
            phase: Phase::Inhale,
            time_remaining: 1.0,
            is_running: true,
            is_paused: false,
            total_elapsed,
        }
    }

    #[test]
    fn auto_stop_truth_table() {
        assert!(!should_allow_auto_stop(3.0, 300.0));
        assert!(!should_allow_auto_stop(5.0, 300.0));
        assert!(should_allow_auto_stop(300.0, 300.0));
        assert!(should_allow_auto_stop(50.0, 50.0));
    }

    #[test]
    fn short_targets_have_no_floor() {
        assert!(should_allow_auto_stop(0.0, 0.0));
        assert!(should_allow_auto_stop(2.0, 1.0));
        assert!(should_allow_auto_stop(60.0, 60.0));
    }

    #[test]
    fn long_targets_need_five_seconds() {
        // A target of 61 can never be met before 5s anyway, but the floor
        // also covers elapsed values that look complete for huge targets.
        assert!(!should_allow_auto_stop(4.9, 61.0));
        assert!(should_allow_auto_stop(61.0, 61.0));
    }

    #[test]
    fn guard_fires_once() {
        let mut guard = AutoStopGuard::new(50);
        assert!(!guard.observe(&running(49.9)));
        assert!(guard.observe(&running(50.0)));
        assert!(!guard.observe(&running(50.1)));
        assert!(guard.has_fired());
        guard.reset();
        assert!(guard.observe(&running(51.0)));
    }

    #[test]
    fn guard_ignores_paused_stopped_and_zero_targets() {
        let mut guard = AutoStopGuard::new(30);
        let mut state = running(31.0);
        state.is_paused = true;
        assert!(!guard.observe(&state));
        state.is_paused = false;
        state.is_running = false;
        assert!(!guard.observe(&state));

        let mut zero = AutoStopGuard::new(0);
        assert!(!zero.observe(&running(100.0)));
    }
}
