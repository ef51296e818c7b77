use serde::{Deserialize, Serialize};
use tracing::warn;

use super::phase::Phase;
use crate::error::PatternError;

/// Cycle length substituted when a pattern sums to zero or a non-finite value.
pub const FALLBACK_CYCLE_SECS: f64 = 8.0;

/// A four-phase breathing pattern.
///
/// Durations are seconds. Field names serialize in camelCase so the same JSON
/// that a front end passes around (`holdTop`, `holdBottom`) parses directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreathingPattern {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub inhale: f64,
    pub hold_top: f64,
    pub exhale: f64,
    pub hold_bottom: f64,
}

impl BreathingPattern {
    pub fn new(id: &str, name: &str, description: &str, durations: [f64; 4]) -> Self {
        let [inhale, hold_top, exhale, hold_bottom] = durations;
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            inhale,
            hold_top,
            exhale,
            hold_bottom,
        }
    }

    /// The pattern used when the caller hands over something unplayable.
    pub fn fallback() -> Self {
        Self::new("default", "Default", "Default", [4.0, 0.0, 4.0, 0.0])
    }

    /// Parse a serialized pattern and reject anything the engine cannot run.
    pub fn from_json(json: &str) -> Result<Self, PatternError> {
        let pattern: BreathingPattern = serde_json::from_str(json)?;
        pattern.validate()?;
        Ok(pattern)
    }

    pub fn validate(&self) -> Result<(), PatternError> {
        for phase in Phase::SEQUENCE {
            let value = self.duration(phase);
            if !value.is_finite() || value < 0.0 {
                return Err(PatternError::InvalidDuration {
                    phase: phase.as_str(),
                    value,
                });
            }
        }
        if Phase::SEQUENCE.iter().all(|p| self.duration(*p) == 0.0) {
            return Err(PatternError::EmptyCycle(self.id.clone()));
        }
        Ok(())
    }

    pub fn is_playable(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn duration(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Inhale => self.inhale,
            Phase::HoldTop => self.hold_top,
            Phase::Exhale => self.exhale,
            Phase::HoldBottom => self.hold_bottom,
        }
    }

    /// Sum of the four phases, never zero or NaN.
    pub fn cycle_length_secs(&self) -> f64 {
        let total = self.inhale + self.hold_top + self.exhale + self.hold_bottom;
        if !total.is_finite() || total <= 0.0 {
            warn!(
                pattern = %self.id,
                total,
                "invalid cycle length, using fallback of {FALLBACK_CYCLE_SECS}s"
            );
            return FALLBACK_CYCLE_SECS;
        }
        total
    }

    pub fn breaths_per_minute(&self) -> f64 {
        60.0 / self.cycle_length_secs()
    }

    /// Session length in seconds for a whole number of cycles.
    pub fn duration_for_cycles(&self, cycles: u32) -> f64 {
        f64::from(cycles.max(1)) * self.cycle_length_secs()
    }

    /// "4-7-8" style summary, omitting zero holds.
    pub fn timing_label(&self) -> String {
        Phase::SEQUENCE
            .iter()
            .map(|p| self.duration(*p))
            .filter(|d| *d > 0.0)
            .map(|d| format!("{d}"))
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Built-in presets.
pub fn presets() -> Vec<BreathingPattern> {
    vec![
        BreathingPattern::new("equal", "Equal Breathing", "4-4", [4.0, 0.0, 4.0, 0.0]),
        BreathingPattern::new("box", "Box Breathing", "4-4-4-4", [4.0, 4.0, 4.0, 4.0]),
        BreathingPattern::new("478", "4-7-8 Deep Sleep", "4-7-8", [4.0, 7.0, 8.0, 0.0]),
    ]
}

pub fn find_preset(id: &str) -> Option<BreathingPattern> {
    presets().into_iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_breathing_cycle_is_eight_seconds() {
        let p = find_preset("equal").unwrap();
        assert_eq!(p.cycle_length_secs(), 8.0);
        assert_eq!(p.breaths_per_minute(), 7.5);
    }

    #[test]
    fn all_zero_pattern_uses_fallback_cycle() {
        let p = BreathingPattern::new("zero", "Zero", "", [0.0; 4]);
        assert_eq!(p.cycle_length_secs(), FALLBACK_CYCLE_SECS);
        assert!(!p.is_playable());
    }

    #[test]
    fn non_finite_cycle_uses_fallback() {
        let p = BreathingPattern::new("inf", "Inf", "", [f64::INFINITY, 0.0, 1.0, 0.0]);
        assert_eq!(p.cycle_length_secs(), FALLBACK_CYCLE_SECS);
        let p = BreathingPattern::new("nan", "NaN", "", [f64::NAN, 0.0, 1.0, 0.0]);
        assert_eq!(p.cycle_length_secs(), FALLBACK_CYCLE_SECS);
    }

    #[test]
    fn parses_camel_case_json() {
        let json = r#"{"id":"box","name":"Box Breathing","description":"4-4-4-4",
            "inhale":4,"holdTop":4,"exhale":4,"holdBottom":4}"#;
        let p = BreathingPattern::from_json(json).unwrap();
        assert_eq!(p, find_preset("box").unwrap());
    }

    #[test]
    fn description_is_optional() {
        let json = r#"{"id":"c","name":"Custom","inhale":5,"holdTop":0,"exhale":5,"holdBottom":0}"#;
        let p = BreathingPattern::from_json(json).unwrap();
        assert!(p.description.is_empty());
    }

    #[test]
    fn rejects_malformed_and_invalid_patterns() {
        assert!(matches!(
            BreathingPattern::from_json("{not json"),
            Err(PatternError::Malformed(_))
        ));
        assert!(matches!(
            BreathingPattern::from_json(r#"{"id":"x","name":"x","inhale":4}"#),
            Err(PatternError::Malformed(_))
        ));
        let negative = r#"{"id":"n","name":"n","inhale":-1,"holdTop":0,"exhale":4,"holdBottom":0}"#;
        assert!(matches!(
            BreathingPattern::from_json(negative),
            Err(PatternError::InvalidDuration { phase: "inhale", .. })
        ));
        let empty = r#"{"id":"e","name":"e","inhale":0,"holdTop":0,"exhale":0,"holdBottom":0}"#;
        assert!(matches!(
            BreathingPattern::from_json(empty),
            Err(PatternError::EmptyCycle(_))
        ));
    }

    #[test]
    fn timing_label_skips_zero_holds() {
        assert_eq!(find_preset("478").unwrap().timing_label(), "4-7-8");
        assert_eq!(find_preset("equal").unwrap().timing_label(), "4-4");
    }

    #[test]
    fn duration_for_cycles_multiplies_cycle_length() {
        let p = find_preset("box").unwrap();
        assert_eq!(p.duration_for_cycles(4), 64.0);
        assert_eq!(p.duration_for_cycles(0), 16.0);
    }
}
