//! Breath-hold test timer.

use std::sync::Arc;

use super::clock::Clock;

/// Stopwatch for a single breath-hold attempt.
pub struct BreathHoldTimer {
    clock: Arc<dyn Clock>,
    started_ms: Option<u64>,
}

impl BreathHoldTimer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            started_ms: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_ms.is_some()
    }

    /// Begin an attempt. A running attempt is restarted.
    pub fn start(&mut self) {
        self.started_ms = Some(self.clock.now_ms());
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_ms
            .map(|start| self.clock.now_ms().saturating_sub(start))
            .unwrap_or(0)
    }

    /// Finish the attempt. `None` when nothing was running or no time passed.
    pub fn stop(&mut self) -> Option<u64> {
        let elapsed = self.elapsed_ms();
        self.started_ms.take()?;
        (elapsed > 0).then_some(elapsed)
    }
}

/// `hh:mm:ss` for a duration in milliseconds.
pub fn format_hold(ms: u64) -> String {
    let total = ms / 1000;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
