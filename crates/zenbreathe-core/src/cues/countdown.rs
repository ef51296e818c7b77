/// Spoken "3, 2, 1" before the first phase.
///
/// Numerals are released on whole-second boundaries from `started_ms`. The
/// countdown only finishes once every numeral has been handed out, so a
/// throttled tick loop delays the numerals instead of dropping them.
/// Paused time is shifted out of the count on resume.
#[derive(Debug, Clone)]
pub struct PreSessionCountdown {
    from: u32,
    started_ms: u64,
    next_numeral: u32,
    paused_at: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    Announce(u32),
    Waiting,
    Finished,
}

impl PreSessionCountdown {
    pub fn new(from: u32, now_ms: u64) -> Self {
        Self {
            from,
            started_ms: now_ms,
            next_numeral: from,
            paused_at: None,
        }
    }

    pub fn from(&self) -> u32 {
        self.from
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Freeze the count. Returns false when already paused.
    pub fn pause(&mut self, now_ms: u64) -> bool {
        if self.paused_at.is_some() {
            return false;
        }
        self.paused_at = Some(now_ms);
        true
    }

    /// Continue from where the count was frozen. Returns false when not paused.
    pub fn resume(&mut self, now_ms: u64) -> bool {
        let Some(paused_at) = self.paused_at.take() else {
            return false;
        };
        self.started_ms += now_ms.saturating_sub(paused_at);
        true
    }

    /// Whole seconds left before the breathing cycle begins.
    pub fn remaining_secs(&self, now_ms: u64) -> u32 {
        let now_ms = self.paused_at.unwrap_or(now_ms);
        let elapsed = (now_ms.saturating_sub(self.started_ms) / 1000) as u32;
        self.from.saturating_sub(elapsed)
    }

    pub fn poll(&mut self, now_ms: u64) -> CountdownStep {
        if self.paused_at.is_some() {
            return CountdownStep::Waiting;
        }
        let remaining = self.remaining_secs(now_ms);
        if self.next_numeral > 0 && self.next_numeral >= remaining {
            let n = self.next_numeral;
            self.next_numeral -= 1;
            return CountdownStep::Announce(n);
        }
        if remaining == 0 && self.next_numeral == 0 {
            CountdownStep::Finished
        } else {
            CountdownStep::Waiting
        }
    }
}
