//! Speech synthesis channel.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// One spoken prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    /// 0.0 ..= 1.0
    pub volume: f32,
    pub rate: f32,
    pub pitch: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, volume: f32) -> Self {
        Self {
            text: text.into(),
            volume: volume.clamp(0.0, 1.0),
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

/// How an utterance relates to speech already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    /// Phase announcements: a later announcement may cut this one short.
    Interrupt,
    /// Countdown numerals: play after whatever is already queued.
    Queue,
}

/// A speech synthesizer. Implementations must return promptly; speaking is
/// fire-and-forget from the engine's point of view.
pub trait SpeechChannel: Send {
    fn speak(&mut self, utterance: Utterance, delivery: Delivery) -> Result<(), ChannelError>;

    /// Drop pending and ongoing speech.
    fn cancel(&mut self) -> Result<(), ChannelError>;
}

/// Platform without speech synthesis.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSpeech;

impl SpeechChannel for NullSpeech {
    fn speak(&mut self, _utterance: Utterance, _delivery: Delivery) -> Result<(), ChannelError> {
        Err(ChannelError::Unavailable("speech"))
    }

    fn cancel(&mut self) -> Result<(), ChannelError> {
        Err(ChannelError::Unavailable("speech"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechLogEntry {
    Spoken { utterance: Utterance, delivery: Delivery },
    Cancelled,
}

/// Records every request. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemorySpeech {
    log: Arc<Mutex<Vec<SpeechLogEntry>>>,
}

impl MemorySpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<SpeechLogEntry> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                SpeechLogEntry::Spoken { utterance, .. } => Some(utterance.text),
                SpeechLogEntry::Cancelled => None,
            })
            .collect()
    }

    pub fn cancel_count(&self) -> usize {
        self.entries()
            .iter()
            .filter(|e| matches!(e, SpeechLogEntry::Cancelled))
            .count()
    }

    fn push(&self, entry: SpeechLogEntry) -> Result<(), ChannelError> {
        let mut log = self.log.lock().map_err(|e| ChannelError::Failed {
            channel: "speech",
            message: e.to_string(),
        })?;
        log.push(entry);
        Ok(())
    }
}

impl SpeechChannel for MemorySpeech {
    fn speak(&mut self, utterance: Utterance, delivery: Delivery) -> Result<(), ChannelError> {
        self.push(SpeechLogEntry::Spoken { utterance, delivery })
    }

    fn cancel(&mut self) -> Result<(), ChannelError> {
        self.push(SpeechLogEntry::Cancelled)
    }
}
