//! Cue dispatch: spoken prompts and vibration pulses at phase boundaries.
//!
//! Voice is gated by two independent settings, guided meditation and voice
//! volume. Haptics ignore both and fire on every phase entry. Speech is
//! fire-and-forget; the only cancellation is the explicit [`CueDispatcher::cancel`]
//! issued by pause and stop.

pub mod countdown;
pub mod haptics;
pub mod speech;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::breath::Phase;
use crate::error::ChannelError;

pub use countdown::{CountdownStep, PreSessionCountdown};
pub use haptics::{HapticChannel, MemoryHaptics, NullHaptics, DEFAULT_PULSE_MS};
pub use speech::{Delivery, MemorySpeech, NullSpeech, SpeechChannel, SpeechLogEntry, Utterance};

/// Voice settings for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub guided_enabled: bool,
    /// 0 ..= 100
    pub volume: u8,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            guided_enabled: true,
            volume: 80,
        }
    }
}

impl VoiceSettings {
    pub fn new(guided_enabled: bool, volume: u8) -> Self {
        Self {
            guided_enabled,
            volume: volume.min(100),
        }
    }

    pub fn is_audible(&self) -> bool {
        self.guided_enabled && self.volume > 0
    }

    pub fn normalized_volume(&self) -> f32 {
        f32::from(self.volume) / 100.0
    }
}

pub struct CueDispatcher {
    voice: VoiceSettings,
    pulse_ms: u32,
    speech: Box<dyn SpeechChannel>,
    haptics: Box<dyn HapticChannel>,
}

impl fmt::Debug for CueDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CueDispatcher")
            .field("voice", &self.voice)
            .field("pulse_ms", &self.pulse_ms)
            .finish_non_exhaustive()
    }
}

impl CueDispatcher {
    pub fn new(
        voice: VoiceSettings,
        speech: Box<dyn SpeechChannel>,
        haptics: Box<dyn HapticChannel>,
    ) -> Self {
        Self {
            voice,
            pulse_ms: DEFAULT_PULSE_MS,
            speech,
            haptics,
        }
    }

    /// No speech, no vibration.
    pub fn silent() -> Self {
        Self::new(
            VoiceSettings::default(),
            Box::new(NullSpeech),
            Box::new(NullHaptics),
        )
    }

    pub fn with_pulse_ms(mut self, pulse_ms: u32) -> Self {
        self.pulse_ms = pulse_ms;
        self
    }

    pub fn voice(&self) -> VoiceSettings {
        self.voice
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.voice.volume = volume.min(100);
    }

    pub fn set_guided_enabled(&mut self, enabled: bool) {
        self.voice.guided_enabled = enabled;
    }

    /// Cue for entering `phase`: always a pulse, plus the spoken prompt when
    /// voice is audible. Returns whether speech was dispatched.
    pub fn phase_entered(&mut self, phase: Phase) -> bool {
        self.pulse();
        self.announce_phase(phase)
    }

    /// Spoken phase prompt. May be cut short by the next announcement.
    pub fn announce_phase(&mut self, phase: Phase) -> bool {
        self.say(phase.guidance(), Delivery::Interrupt)
    }

    /// Spoken countdown numeral, queued behind earlier numerals.
    pub fn announce_countdown(&mut self, numeral: u32) -> bool {
        self.say(&numeral.to_string(), Delivery::Queue)
    }

    pub fn pulse(&mut self) {
        if let Err(e) = self.haptics.vibrate(self.pulse_ms) {
            log_channel_error(&e);
        }
    }

    /// Silence anything pending or playing.
    pub fn cancel(&mut self) {
        if let Err(e) = self.speech.cancel() {
            log_channel_error(&e);
        }
    }

    fn say(&mut self, text: &str, delivery: Delivery) -> bool {
        if !self.voice.is_audible() {
            return false;
        }
        let utterance = Utterance::new(text, self.voice.normalized_volume());
        match self.speech.speak(utterance, delivery) {
            Ok(()) => true,
            Err(e) => {
                log_channel_error(&e);
                false
            }
        }
    }
}

fn log_channel_error(err: &ChannelError) {
    debug!(error = %err, "cue channel degraded");
}
