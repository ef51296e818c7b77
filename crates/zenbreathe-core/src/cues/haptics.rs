//! Vibration channel.

use std::sync::{Arc, Mutex};

use crate::error::ChannelError;

/// Length of the pulse fired on every phase entry.
pub const DEFAULT_PULSE_MS: u32 = 50;

pub trait HapticChannel: Send {
    fn vibrate(&mut self, duration_ms: u32) -> Result<(), ChannelError>;
}

/// Platform without a vibration motor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHaptics;

impl HapticChannel for NullHaptics {
    fn vibrate(&mut self, _duration_ms: u32) -> Result<(), ChannelError> {
        Err(ChannelError::Unavailable("vibration"))
    }
}

/// Records pulse lengths. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryHaptics {
    pulses: Arc<Mutex<Vec<u32>>>,
}

impl MemoryHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pulses(&self) -> Vec<u32> {
        self.pulses.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.pulses().len()
    }
}

impl HapticChannel for MemoryHaptics {
    fn vibrate(&mut self, duration_ms: u32) -> Result<(), ChannelError> {
        let mut pulses = self.pulses.lock().map_err(|e| ChannelError::Failed {
            channel: "vibration",
            message: e.to_string(),
        })?;
        pulses.push(duration_ms);
        Ok(())
    }
}
