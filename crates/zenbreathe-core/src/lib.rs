//! # Zenbreathe Core Library
//!
//! This library provides the core logic for the zenbreathe guided-breathing
//! player. Every operation is available through the standalone CLI binary;
//! other front ends are thin layers over the same core.
//!
//! ## Architecture
//!
//! - **Breathing Engine**: A wall-clock-based phase scheduler that requires
//!   the caller to periodically invoke `tick()`. Elapsed time is always
//!   recomputed from absolute instants, so irregular ticks never drift.
//! - **Cues**: Spoken prompts and haptic pulses at phase boundaries, through
//!   best-effort platform channels
//! - **Session**: Countdown, auto-stop, wake lock, ambient audio and the single
//!   session record, wrapped around the engine
//! - **Storage**: SQLite-based session storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`BreathingEngine`]: Core phase state machine
//! - [`SessionPlayer`]: One session from start to close
//! - [`SessionDriver`]: Tokio ticker around a player
//! - [`Database`]: Session and breath-hold persistence
//! - [`Config`]: Application configuration management

pub mod breath;
pub mod cues;
pub mod error;
pub mod events;
pub mod platform;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod storage;

pub use breath::{
    parse_target_duration, validate_duration, BreathHoldTimer, BreathingEngine, BreathingPattern,
    Clock, EngineState, ManualClock, Phase, SystemClock,
};
pub use cues::{CueDispatcher, VoiceSettings};
pub use error::{ChannelError, ConfigError, CoreError, DatabaseError, PatternError};
pub use events::Event;
pub use platform::AmbientMode;
pub use runtime::{SessionDriver, TokioClock};
pub use session::SessionPlayer;
pub use storage::{Config, Database, SessionRecord, SessionStore};
