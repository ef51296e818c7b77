//! Property tests for the breathing engine's phase scheduling.

use std::sync::Arc;

use proptest::prelude::*;
use zenbreathe_core::breath::FALLBACK_CYCLE_SECS;
use zenbreathe_core::cues::{MemoryHaptics, MemorySpeech};
use zenbreathe_core::{
    BreathingEngine, BreathingPattern, CueDispatcher, Event, ManualClock, Phase, VoiceSettings,
};

/// Durations in whole tenths of a second; zero is common so skips get exercised.
fn duration() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), (1u32..=80).prop_map(|t| f64::from(t) / 10.0)]
}

fn playable_pattern() -> impl Strategy<Value = BreathingPattern> {
    [duration(), duration(), duration(), duration()]
        .prop_filter("at least one phase must be positive", |d| {
            d.iter().any(|v| *v > 0.0)
        })
        .prop_map(|d| BreathingPattern::new("p", "Property", "", d))
}

fn engine(pattern: BreathingPattern) -> (BreathingEngine, ManualClock, MemoryHaptics) {
    let clock = ManualClock::new(0);
    let haptics = MemoryHaptics::new();
    let cues = CueDispatcher::new(
        VoiceSettings::default(),
        Box::new(MemorySpeech::new()),
        Box::new(haptics.clone()),
    );
    (
        BreathingEngine::new(pattern, Arc::new(clock.clone()), cues),
        clock,
        haptics,
    )
}

proptest! {
    #[test]
    fn phases_follow_cyclic_order_and_never_stall(
        pattern in playable_pattern(),
        ticks in 50usize..400,
    ) {
        let (mut engine, clock, haptics) = engine(pattern.clone());
        engine.start();
        let mut entered = vec![engine.state().phase];

        for _ in 0..ticks {
            clock.advance_ms(100);
            if let Some(Event::PhaseEntered { phase, duration_secs, skipped, .. }) = engine.tick() {
                let previous = *entered.last().unwrap();
                // Walk forward from the previous phase through the skipped ones.
                let mut expected = previous.next();
                for s in &skipped {
                    prop_assert_eq!(*s, expected);
                    prop_assert_eq!(pattern.duration(*s), 0.0);
                    expected = expected.next();
                }
                prop_assert_eq!(phase, expected);
                prop_assert!(duration_secs > 0.0);
                entered.push(phase);
            }
        }

        // Every entered phase got exactly one pulse.
        prop_assert_eq!(haptics.count(), entered.len());
        for phase in &entered {
            prop_assert!(pattern.duration(*phase) > 0.0);
        }

        // The engine keeps cycling: total elapsed tracks the clock exactly.
        let expected_elapsed = ticks as f64 * 0.1;
        prop_assert!((engine.state().total_elapsed - expected_elapsed).abs() < 1e-6);

        // Outliving one full cycle means at least one transition happened.
        let cycle = pattern.cycle_length_secs();
        if expected_elapsed > cycle + 0.1 {
            prop_assert!(entered.len() > 1);
        }
    }

    #[test]
    fn time_remaining_never_negative(
        pattern in playable_pattern(),
        gaps in prop::collection::vec(1u64..5_000, 1..40),
    ) {
        let (mut engine, clock, _) = engine(pattern);
        engine.start();
        for gap in gaps {
            clock.advance_ms(gap);
            engine.tick();
            prop_assert!(engine.state().time_remaining >= 0.0);
            prop_assert!(engine.state().total_elapsed >= 0.0);
        }
    }
}

#[test]
fn all_zero_pattern_has_fallback_cycle_length() {
    let pattern = BreathingPattern::new("silent", "Silent", "", [0.0, 0.0, 0.0, 0.0]);
    assert_eq!(pattern.cycle_length_secs(), FALLBACK_CYCLE_SECS);
    assert_eq!(pattern.cycle_length_secs(), 8.0);
}

#[test]
fn single_nonzero_phase_repeats_itself() {
    let pattern = BreathingPattern::new("exhale-only", "Exhale", "", [0.0, 0.0, 3.0, 0.0]);
    let (mut engine, clock, haptics) = engine(pattern);
    engine.start();
    assert_eq!(engine.state().phase, Phase::Exhale);
    clock.advance_ms(3_000);
    match engine.tick() {
        Some(Event::PhaseEntered { phase, skipped, .. }) => {
            assert_eq!(phase, Phase::Exhale);
            assert_eq!(skipped, vec![Phase::HoldBottom, Phase::Inhale, Phase::HoldTop]);
        }
        other => panic!("expected re-entry of exhale, got {other:?}"),
    }
    assert_eq!(haptics.count(), 2);
}
