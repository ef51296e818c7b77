//! Terminal stand-ins for the platform capabilities a session uses.
//!
//! Speech becomes a printed prompt, a haptic pulse becomes the terminal bell
//! and ambient audio is announced once on stderr. In `--json` mode they stay
//! quiet so stdout carries nothing but events.

use std::io::{IsTerminal, Write};

use zenbreathe_core::cues::{Delivery, HapticChannel, SpeechChannel, Utterance};
use zenbreathe_core::platform::{AmbientAudio, AmbientMode};
use zenbreathe_core::ChannelError;

pub struct TerminalSpeech {
    quiet: bool,
}

impl TerminalSpeech {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl SpeechChannel for TerminalSpeech {
    fn speak(&mut self, utterance: Utterance, delivery: Delivery) -> Result<(), ChannelError> {
        if self.quiet {
            return Err(ChannelError::Unavailable("speech"));
        }
        let marker = match delivery {
            Delivery::Interrupt => ">",
            Delivery::Queue => "...",
        };
        println!("  {marker} {}", utterance.text);
        std::io::stdout().flush().map_err(|e| ChannelError::Failed {
            channel: "speech",
            message: e.to_string(),
        })
    }

    fn cancel(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }
}

pub struct TerminalHaptics {
    enabled: bool,
}

impl TerminalHaptics {
    pub fn new(quiet: bool) -> Self {
        Self {
            enabled: !quiet && std::io::stderr().is_terminal(),
        }
    }
}

impl HapticChannel for TerminalHaptics {
    fn vibrate(&mut self, _duration_ms: u32) -> Result<(), ChannelError> {
        if !self.enabled {
            return Err(ChannelError::Unavailable("vibration"));
        }
        let mut err = std::io::stderr();
        err.write_all(b"\x07")
            .and_then(|_| err.flush())
            .map_err(|e| ChannelError::Failed {
                channel: "vibration",
                message: e.to_string(),
            })
    }
}

/// Reports soundscape changes; the terminal has no mixer of its own.
pub struct TerminalAmbient {
    quiet: bool,
    current: Option<AmbientMode>,
}

impl TerminalAmbient {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            current: None,
        }
    }
}

impl AmbientAudio for TerminalAmbient {
    fn play(&mut self, mode: AmbientMode, volume: f32) -> Result<(), ChannelError> {
        if mode == AmbientMode::Off {
            return self.stop_all();
        }
        if self.current != Some(mode) && !self.quiet {
            eprintln!("ambient: {} at {:.0}%", mode.as_str(), volume * 100.0);
        }
        self.current = Some(mode);
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) -> Result<(), ChannelError> {
        Ok(())
    }

    fn stop_all(&mut self) -> Result<(), ChannelError> {
        self.current = None;
        Ok(())
    }
}
