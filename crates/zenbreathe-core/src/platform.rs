//! Best-effort platform capabilities used around a session: keeping the
//! screen awake and looping an ambient soundscape.
//!
//! A platform that lacks one of these simply does nothing. Failures are
//! reported as [`ChannelError`] and logged by the caller, never propagated.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// Background soundscape played under guided sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbientMode {
    #[default]
    Off,
    Rain,
    Waves,
}

impl AmbientMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AmbientMode::Off => "off",
            AmbientMode::Rain => "rain",
            AmbientMode::Waves => "waves",
        }
    }
}

impl std::str::FromStr for AmbientMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(AmbientMode::Off),
            "rain" => Ok(AmbientMode::Rain),
            "waves" => Ok(AmbientMode::Waves),
            other => Err(format!("unknown ambient mode: {other}")),
        }
    }
}

pub trait WakeLock: Send {
    fn acquire(&mut self) -> Result<(), ChannelError>;
    fn release(&mut self) -> Result<(), ChannelError>;
}

pub trait AmbientAudio: Send {
    /// Start looping `mode`, replacing whatever was playing.
    fn play(&mut self, mode: AmbientMode, volume: f32) -> Result<(), ChannelError>;
    fn set_volume(&mut self, volume: f32) -> Result<(), ChannelError>;
    fn stop_all(&mut self) -> Result<(), ChannelError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoWakeLock;

impl WakeLock for NoWakeLock {
    fn acquire(&mut self) -> Result<(), ChannelError> {
        Err(ChannelError::Unavailable("wake lock"))
    }

    fn release(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoAmbientAudio;

impl AmbientAudio for NoAmbientAudio {
    fn play(&mut self, _mode: AmbientMode, _volume: f32) -> Result<(), ChannelError> {
        Err(ChannelError::Unavailable("ambient audio"))
    }

    fn set_volume(&mut self, _volume: f32) -> Result<(), ChannelError> {
        Ok(())
    }

    fn stop_all(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// Wake lock that tracks whether it is held. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryWakeLock {
    held: Arc<Mutex<bool>>,
}

impl MemoryWakeLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.lock().map(|h| *h).unwrap_or(false)
    }

    fn set(&self, value: bool) -> Result<(), ChannelError> {
        let mut held = self.held.lock().map_err(|e| ChannelError::Failed {
            channel: "wake lock",
            message: e.to_string(),
        })?;
        *held = value;
        Ok(())
    }
}

impl WakeLock for MemoryWakeLock {
    fn acquire(&mut self) -> Result<(), ChannelError> {
        self.set(true)
    }

    fn release(&mut self) -> Result<(), ChannelError> {
        self.set(false)
    }
}

/// Ambient player that remembers what is playing. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryAmbientAudio {
    playing: Arc<Mutex<Option<(AmbientMode, f32)>>>,
}

impl MemoryAmbientAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playing(&self) -> Option<(AmbientMode, f32)> {
        self.playing.lock().ok().and_then(|p| *p)
    }

    fn update(
        &self,
        f: impl FnOnce(&mut Option<(AmbientMode, f32)>),
    ) -> Result<(), ChannelError> {
        let mut playing = self.playing.lock().map_err(|e| ChannelError::Failed {
            channel: "ambient audio",
            message: e.to_string(),
        })?;
        f(&mut playing);
        Ok(())
    }
}

impl AmbientAudio for MemoryAmbientAudio {
    fn play(&mut self, mode: AmbientMode, volume: f32) -> Result<(), ChannelError> {
        self.update(|p| {
            *p = match mode {
                AmbientMode::Off => None,
                mode => Some((mode, volume)),
            }
        })
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), ChannelError> {
        self.update(|p| {
            if let Some((_, v)) = p.as_mut() {
                *v = volume;
            }
        })
    }

    fn stop_all(&mut self) -> Result<(), ChannelError> {
        self.update(|p| *p = None)
    }
}
