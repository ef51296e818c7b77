//! Breathing timing: patterns, phases, the wall-clock engine and the
//! helpers that decide when a session ends.

pub mod clock;
pub mod duration;
pub mod engine;
pub mod guard;
pub mod hold;
pub mod pattern;
pub mod phase;

pub use clock::{Clock, ManualClock, SystemClock};
pub use duration::{
    parse_target_duration, validate_duration, MAX_DURATION_SECS, MIN_DURATION_SECS,
    SAFE_FALLBACK_DURATION_SECS,
};
pub use engine::{BreathingEngine, EngineState};
pub use guard::{should_allow_auto_stop, AutoStopGuard};
pub use hold::{format_hold, BreathHoldTimer};
pub use pattern::{find_preset, presets, BreathingPattern, FALLBACK_CYCLE_SECS};
pub use phase::{resolve_entry, resolve_next_phase, Phase, PhaseEntry};
