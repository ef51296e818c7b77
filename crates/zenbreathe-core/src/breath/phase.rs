use serde::{Deserialize, Serialize};

use super::pattern::BreathingPattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Inhale,
    HoldTop,
    Exhale,
    HoldBottom,
}

impl Phase {
    /// Fixed cyclic order of a breath.
    pub const SEQUENCE: [Phase; 4] = [Phase::Inhale, Phase::HoldTop, Phase::Exhale, Phase::HoldBottom];

    pub fn index(self) -> usize {
        match self {
            Phase::Inhale => 0,
            Phase::HoldTop => 1,
            Phase::Exhale => 2,
            Phase::HoldBottom => 3,
        }
    }

    pub fn next(self) -> Phase {
        Self::SEQUENCE[(self.index() + 1) % Self::SEQUENCE.len()]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Inhale => "inhale",
            Phase::HoldTop => "holdTop",
            Phase::Exhale => "exhale",
            Phase::HoldBottom => "holdBottom",
        }
    }

    /// Spoken prompt announced on entry.
    pub fn guidance(self) -> &'static str {
        match self {
            Phase::Inhale => "Breathe in",
            Phase::HoldTop | Phase::HoldBottom => "Hold",
            Phase::Exhale => "Breathe out",
        }
    }

    /// Lower-case label shown under the breathing circle.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Inhale => "breathe in",
            Phase::HoldTop | Phase::HoldBottom => "hold",
            Phase::Exhale => "breathe out",
        }
    }
}

/// Outcome of entering a phase, after zero-duration phases were skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseEntry {
    pub phase: Phase,
    pub duration_secs: f64,
    /// Phases passed over because their duration is zero. They get no cue.
    pub skipped: Vec<Phase>,
}

/// First phase with a nonzero duration, starting at `candidate` itself.
///
/// Walks at most one full cycle. Returns `None` only for a pattern whose
/// phases are all zero.
pub fn resolve_entry(pattern: &BreathingPattern, candidate: Phase) -> Option<PhaseEntry> {
    let mut phase = candidate;
    let mut skipped = Vec::new();
    for _ in 0..Phase::SEQUENCE.len() {
        let duration_secs = pattern.duration(phase);
        if duration_secs > 0.0 {
            return Some(PhaseEntry {
                phase,
                duration_secs,
                skipped,
            });
        }
        skipped.push(phase);
        phase = phase.next();
    }
    None
}

/// Phase entered when `current` expires.
pub fn resolve_next_phase(pattern: &BreathingPattern, current: Phase) -> Option<PhaseEntry> {
    resolve_entry(pattern, current.next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breath::pattern::find_preset;

    #[test]
    fn next_wraps_around() {
        assert_eq!(Phase::HoldBottom.next(), Phase::Inhale);
        assert_eq!(Phase::Inhale.next(), Phase::HoldTop);
    }

    #[test]
    fn equal_breathing_skips_both_holds() {
        let p = find_preset("equal").unwrap();
        let entry = resolve_next_phase(&p, Phase::Inhale).unwrap();
        assert_eq!(entry.phase, Phase::Exhale);
        assert_eq!(entry.skipped, vec![Phase::HoldTop]);
        let entry = resolve_next_phase(&p, Phase::Exhale).unwrap();
        assert_eq!(entry.phase, Phase::Inhale);
        assert_eq!(entry.skipped, vec![Phase::HoldBottom]);
    }

    #[test]
    fn box_breathing_skips_nothing() {
        let p = find_preset("box").unwrap();
        for phase in Phase::SEQUENCE {
            let entry = resolve_next_phase(&p, phase).unwrap();
            assert_eq!(entry.phase, phase.next());
            assert!(entry.skipped.is_empty());
        }
    }

    #[test]
    fn consecutive_zero_phases_are_all_skipped() {
        let p = BreathingPattern::new("x", "x", "", [0.0, 0.0, 0.0, 3.0]);
        let entry = resolve_entry(&p, Phase::Inhale).unwrap();
        assert_eq!(entry.phase, Phase::HoldBottom);
        assert_eq!(entry.skipped.len(), 3);
        // A single nonzero phase re-enters itself.
        let entry = resolve_next_phase(&p, Phase::HoldBottom).unwrap();
        assert_eq!(entry.phase, Phase::HoldBottom);
        assert_eq!(entry.skipped.len(), 3);
    }

    #[test]
    fn all_zero_pattern_resolves_to_none() {
        let p = BreathingPattern::new("z", "z", "", [0.0; 4]);
        assert!(resolve_entry(&p, Phase::Inhale).is_none());
    }

    #[test]
    fn serializes_camel_case() {
        assert_eq!(serde_json::to_string(&Phase::HoldTop).unwrap(), "\"holdTop\"");
    }
}
