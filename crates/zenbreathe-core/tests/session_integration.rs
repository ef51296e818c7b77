//! Integration tests for full sessions against a real database.

use std::sync::Arc;

use zenbreathe_core::breath::{find_preset, parse_target_duration};
use zenbreathe_core::cues::{MemoryHaptics, MemorySpeech};
use zenbreathe_core::{
    CueDispatcher, Database, Event, ManualClock, Phase, SessionPlayer, VoiceSettings,
};

fn player(
    pattern: &str,
    raw_duration: Option<&str>,
    db: Database,
) -> (SessionPlayer, ManualClock, MemorySpeech) {
    let clock = ManualClock::new(1_760_000_000_000);
    let speech = MemorySpeech::new();
    let cues = CueDispatcher::new(
        VoiceSettings::default(),
        Box::new(speech.clone()),
        Box::new(MemoryHaptics::new()),
    );
    let player = SessionPlayer::new(
        find_preset(pattern).unwrap(),
        parse_target_duration(raw_duration),
        Arc::new(clock.clone()),
        cues,
        Box::new(db),
    );
    (player, clock, speech)
}

fn tick_for(player: &mut SessionPlayer, clock: &ManualClock, secs: u64) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..secs * 10 {
        clock.advance_ms(100);
        events.extend(player.tick());
    }
    events
}

#[test]
fn auto_stopped_session_is_written_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zenbreathe.db");
    let (mut player, clock, _) = player("478", Some("60"), Database::open_at(&path).unwrap());

    player.begin();
    let events = tick_for(&mut player, &clock, 61);
    let recorded: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, Event::SessionRecorded { .. }))
        .collect();
    assert_eq!(recorded.len(), 1);

    // More ticks and an explicit close must not add another row.
    tick_for(&mut player, &clock, 10);
    player.close();
    player.close();

    let sessions = Database::open_at(&path).unwrap().breathing_sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].exercise_name, "4-7-8 Deep Sleep");
    assert_eq!(sessions[0].duration_ms, 60_000);
}

#[test]
fn paused_time_is_not_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zenbreathe.db");
    let (mut player, clock, speech) = player("box", Some("120"), Database::open_at(&path).unwrap());

    player.begin();
    tick_for(&mut player, &clock, 10);
    player.pause();
    clock.advance_ms(5 * 60 * 1000);
    player.resume();
    tick_for(&mut player, &clock, 5);
    player.close();

    assert!(speech.cancel_count() >= 2);
    let sessions = Database::open_at(&path).unwrap().breathing_sessions().unwrap();
    assert_eq!(sessions[0].duration_ms, 15_000);
}

#[test]
fn invalid_duration_falls_back_to_five_minutes() {
    let db = Database::open_memory().unwrap();
    let (mut player, clock, _) = player("equal", Some("abc"), db);
    assert_eq!(player.target_secs(), 300);

    player.begin();
    tick_for(&mut player, &clock, 299);
    assert!(player.engine().state().is_running);
    tick_for(&mut player, &clock, 1);
    assert!(!player.engine().state().is_running);
    assert!(player.is_logged());
}

#[test]
fn equal_breathing_exhales_after_four_seconds() {
    let db = Database::open_memory().unwrap();
    let (mut player, clock, speech) = player("equal", None, db);
    player.begin();
    tick_for(&mut player, &clock, 4);
    let state = player.engine().state();
    assert_eq!(state.phase, Phase::Exhale);
    assert_eq!(state.time_remaining, 4.0);
    assert_eq!(speech.spoken_texts(), vec!["Breathe in", "Breathe out"]);
}
