//! A single breathing session from start to close.
//!
//! [`SessionPlayer`] owns the engine and everything that happens around it:
//! the optional spoken countdown, the auto-stop guard, the wake lock, the
//! ambient soundscape and the one record written when the session ends.
//!
//! A session is recorded at most once. The guard path and the explicit
//! [`SessionPlayer::close`] path share the session-start marker and the
//! `logged` flag, so whichever runs first wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::breath::{AutoStopGuard, BreathingEngine, BreathingPattern, Clock};
use crate::cues::{CountdownStep, CueDispatcher, PreSessionCountdown};
use crate::error::ChannelError;
use crate::events::Event;
use crate::platform::{AmbientAudio, AmbientMode, NoAmbientAudio, NoWakeLock, WakeLock};
use crate::storage::SessionStore;

pub struct SessionPlayer {
    engine: BreathingEngine,
    guard: AutoStopGuard,
    clock: Arc<dyn Clock>,
    store: Box<dyn SessionStore + Send>,
    wake_lock: Box<dyn WakeLock>,
    wake_held: bool,
    ambient: Box<dyn AmbientAudio>,
    ambient_mode: AmbientMode,
    ambient_volume: u8,
    countdown_secs: u32,
    countdown: Option<PreSessionCountdown>,
    started_at: Option<DateTime<Utc>>,
    logged: bool,
}

impl std::fmt::Debug for SessionPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPlayer")
            .field("engine", &self.engine)
            .field("guard", &self.guard)
            .field("countdown", &self.countdown)
            .field("started_at", &self.started_at)
            .field("logged", &self.logged)
            .finish_non_exhaustive()
    }
}

impl SessionPlayer {
    /// `target_secs` should already have been through the duration validator.
    pub fn new(
        pattern: BreathingPattern,
        target_secs: u64,
        clock: Arc<dyn Clock>,
        cues: CueDispatcher,
        store: Box<dyn SessionStore + Send>,
    ) -> Self {
        let engine = BreathingEngine::new(pattern, Arc::clone(&clock), cues);
        Self {
            engine,
            guard: AutoStopGuard::new(target_secs),
            clock,
            store,
            wake_lock: Box::new(NoWakeLock),
            wake_held: false,
            ambient: Box::new(NoAmbientAudio),
            ambient_mode: AmbientMode::Off,
            ambient_volume: 50,
            countdown_secs: 0,
            countdown: None,
            started_at: None,
            logged: false,
        }
    }

    pub fn with_countdown(mut self, secs: u32) -> Self {
        self.countdown_secs = secs;
        self
    }

    pub fn with_wake_lock(mut self, wake_lock: Box<dyn WakeLock>) -> Self {
        self.wake_lock = wake_lock;
        self
    }

    pub fn with_ambient(
        mut self,
        ambient: Box<dyn AmbientAudio>,
        mode: AmbientMode,
        volume: u8,
    ) -> Self {
        self.ambient = ambient;
        self.ambient_mode = mode;
        self.ambient_volume = volume.min(100);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &BreathingEngine {
        &self.engine
    }

    pub fn target_secs(&self) -> u64 {
        self.guard.target_secs()
    }

    pub fn exercise_name(&self) -> &str {
        &self.engine.pattern().name
    }

    pub fn in_countdown(&self) -> bool {
        self.countdown.is_some()
    }

    /// Whole seconds left in the pre-session countdown.
    pub fn countdown_remaining(&self) -> Option<u32> {
        self.countdown
            .as_ref()
            .map(|c| c.remaining_secs(self.clock.now_ms()))
    }

    /// Counting down or breathing, and not paused.
    pub fn is_active(&self) -> bool {
        self.countdown.as_ref().is_some_and(|c| !c.is_paused()) || self.engine.is_active()
    }

    pub fn is_logged(&self) -> bool {
        self.logged
    }

    pub fn session_remaining_secs(&self) -> f64 {
        (self.guard.target_secs() as f64 - self.engine.state().total_elapsed).max(0.0)
    }

    pub fn snapshot(&self) -> Event {
        match self.engine.snapshot() {
            Event::StateSnapshot {
                state,
                pattern_id,
                cycle_length_secs,
                phase_progress,
                at,
                ..
            } => Event::StateSnapshot {
                state,
                pattern_id,
                cycle_length_secs,
                phase_progress,
                target_secs: Some(self.guard.target_secs()),
                session_remaining_secs: Some(self.session_remaining_secs()),
                at,
            },
            other => other,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a new session, through the countdown when one is configured.
    pub fn begin(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        self.guard.reset();
        self.logged = false;
        self.started_at = Some(Utc::now());
        self.start_ambient();

        if self.countdown_secs > 0 {
            let mut countdown = PreSessionCountdown::new(self.countdown_secs, self.clock.now_ms());
            if let CountdownStep::Announce(n) = countdown.poll(self.clock.now_ms()) {
                events.push(self.countdown_tick(n));
            }
            self.countdown = Some(countdown);
            debug!(secs = self.countdown_secs, "countdown started");
        } else {
            events.extend(self.engine.start());
        }
        self.sync_wake_lock();
        events
    }

    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();

        if let Some(countdown) = self.countdown.as_mut() {
            match countdown.poll(self.clock.now_ms()) {
                CountdownStep::Announce(n) => events.push(self.countdown_tick(n)),
                CountdownStep::Waiting => {}
                CountdownStep::Finished => {
                    self.countdown = None;
                    events.extend(self.engine.start());
                }
            }
            self.sync_wake_lock();
            return events;
        }

        events.extend(self.engine.tick());

        if self.guard.observe(self.engine.state()) {
            events.extend(self.engine.stop());
            let total_elapsed = self.engine.state().total_elapsed;
            info!(
                total_elapsed,
                target_secs = self.guard.target_secs(),
                "target duration reached"
            );
            events.push(Event::AutoStopped {
                total_elapsed,
                target_secs: self.guard.target_secs(),
                at: Utc::now(),
            });
            events.extend(self.record_once());
        }

        self.sync_wake_lock();
        events
    }

    pub fn pause(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let event = match self.countdown.as_mut() {
            Some(countdown) => {
                if !countdown.pause(now) {
                    return None;
                }
                self.engine.cues_mut().cancel();
                debug!("countdown paused");
                let state = self.engine.state();
                Some(Event::SessionPaused {
                    phase: state.phase,
                    time_remaining: state.time_remaining,
                    total_elapsed: state.total_elapsed,
                    at: Utc::now(),
                })
            }
            None => self.engine.pause(),
        };
        self.sync_wake_lock();
        event
    }

    pub fn resume(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let event = match self.countdown.as_mut() {
            Some(countdown) => {
                if !countdown.resume(now) {
                    return None;
                }
                debug!("countdown resumed");
                let state = self.engine.state();
                Some(Event::SessionResumed {
                    phase: state.phase,
                    time_remaining: state.time_remaining,
                    total_elapsed: state.total_elapsed,
                    at: Utc::now(),
                })
            }
            None => self.engine.resume(),
        };
        self.sync_wake_lock();
        event
    }

    pub fn stop(&mut self) -> Option<Event> {
        if self.countdown.take().is_some() {
            debug!("countdown cancelled by stop");
        }
        let event = self.engine.stop();
        self.sync_wake_lock();
        event
    }

    /// Leave the session. Records it if it ran and was not recorded yet.
    pub fn close(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        self.countdown = None;
        self.engine.cues_mut().cancel();
        if self.engine.state().is_running {
            events.extend(self.engine.stop());
        }
        if self.engine.state().total_elapsed > 0.0 {
            events.extend(self.record_once());
        }
        self.started_at = None;
        log_degraded(self.ambient.stop_all());
        self.sync_wake_lock();
        events
    }

    /// Live voice volume change; takes effect on the next prompt.
    pub fn set_voice_volume(&mut self, volume: u8) {
        self.engine.cues_mut().set_volume(volume);
    }

    pub fn set_guided_enabled(&mut self, enabled: bool) {
        self.engine.cues_mut().set_guided_enabled(enabled);
        self.start_ambient();
    }

    pub fn set_ambient_mode(&mut self, mode: AmbientMode) {
        self.ambient_mode = mode;
        self.start_ambient();
    }

    pub fn set_ambient_volume(&mut self, volume: u8) {
        self.ambient_volume = volume.min(100);
        log_degraded(self.ambient.set_volume(f32::from(self.ambient_volume) / 100.0));
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn countdown_tick(&mut self, remaining: u32) -> Event {
        self.engine.cues_mut().announce_countdown(remaining);
        Event::CountdownTick {
            remaining,
            at: Utc::now(),
        }
    }

    fn record_once(&mut self) -> Option<Event> {
        if self.logged || self.started_at.is_none() {
            return None;
        }
        self.started_at = None;
        self.logged = true;

        let duration_ms = (self.engine.state().total_elapsed * 1000.0).floor() as u64;
        let exercise_name = self.engine.pattern().name.clone();
        match self.store.add_breathing_session(&exercise_name, duration_ms) {
            Ok(record) => {
                info!(exercise = %exercise_name, duration_ms, "session recorded");
                Some(Event::SessionRecorded {
                    exercise_name,
                    duration_ms,
                    at: record.timestamp,
                })
            }
            Err(e) => {
                warn!(error = %e, exercise = %exercise_name, "failed to record session");
                None
            }
        }
    }

    /// Ambient audio follows the configured mode, gated by guided meditation.
    fn start_ambient(&mut self) {
        let guided = self.engine.cues().voice().guided_enabled;
        let result = if !guided || self.ambient_mode == AmbientMode::Off {
            self.ambient.stop_all()
        } else {
            self.ambient
                .play(self.ambient_mode, f32::from(self.ambient_volume) / 100.0)
        };
        log_degraded(result);
    }

    fn sync_wake_lock(&mut self) {
        let want = self.is_active();
        if want == self.wake_held {
            return;
        }
        let result = if want {
            self.wake_lock.acquire()
        } else {
            self.wake_lock.release()
        };
        // A refused lock is not retried until the next state change.
        self.wake_held = want;
        log_degraded(result);
    }
}

/// `mm:ss` for a whole number of seconds.
pub fn format_countdown(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) as u64 } else { 0 };
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn log_degraded(result: Result<(), ChannelError>) {
    if let Err(e) = result {
        debug!(error = %e, "platform capability degraded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breath::{find_preset, ManualClock, Phase};
    use crate::cues::{MemoryHaptics, MemorySpeech, VoiceSettings};
    use crate::platform::{MemoryAmbientAudio, MemoryWakeLock};
    use crate::storage::MemoryStore;

    struct Harness {
        player: SessionPlayer,
        clock: ManualClock,
        speech: MemorySpeech,
        store: MemoryStore,
        wake: MemoryWakeLock,
        ambient: MemoryAmbientAudio,
    }

    fn harness(pattern: &str, target_secs: u64, voice: VoiceSettings) -> Harness {
        let clock = ManualClock::new(1_700_000_000_000);
        let speech = MemorySpeech::new();
        let store = MemoryStore::new();
        let wake = MemoryWakeLock::new();
        let ambient = MemoryAmbientAudio::new();
        let cues = CueDispatcher::new(
            voice,
            Box::new(speech.clone()),
            Box::new(MemoryHaptics::new()),
        );
        let player = SessionPlayer::new(
            find_preset(pattern).unwrap(),
            target_secs,
            Arc::new(clock.clone()),
            cues,
            Box::new(store.clone()),
        )
        .with_wake_lock(Box::new(wake.clone()))
        .with_ambient(Box::new(ambient.clone()), AmbientMode::Rain, 40);
        Harness {
            player,
            clock,
            speech,
            store,
            wake,
            ambient,
        }
    }

    fn run_for(h: &mut Harness, secs: u32) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..secs * 10 {
            h.clock.advance_ms(100);
            events.extend(h.player.tick());
        }
        events
    }

    #[test]
    fn auto_stop_records_exactly_once() {
        let mut h = harness("box", 30, VoiceSettings::default());
        h.player.begin();
        let events = run_for(&mut h, 40);
        assert_eq!(
            events.iter().filter(|e| matches!(e, Event::AutoStopped { .. })).count(),
            1
        );
        assert!(!h.player.engine().state().is_running);
        assert!(h.player.is_logged());

        h.player.close();
        let records = h.store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].exercise_name, "Box Breathing");
        assert_eq!(records[0].duration_ms, 30_000);
    }

    #[test]
    fn close_records_a_partial_session() {
        let mut h = harness("equal", 300, VoiceSettings::default());
        h.player.begin();
        run_for(&mut h, 12);
        let events = h.player.close();
        assert!(events.iter().any(|e| matches!(e, Event::SessionStopped { .. })));
        assert!(events.iter().any(|e| matches!(e, Event::SessionRecorded { duration_ms: 12_000, .. })));
        assert_eq!(h.store.records().len(), 1);
        h.player.close();
        assert_eq!(h.store.records().len(), 1);
    }

    #[test]
    fn close_before_start_records_nothing() {
        let mut h = harness("equal", 300, VoiceSettings::default());
        h.player.close();
        assert!(h.store.records().is_empty());
    }

    #[test]
    fn manual_stop_then_close_records_once() {
        let mut h = harness("box", 300, VoiceSettings::default());
        h.player.begin();
        run_for(&mut h, 8);
        h.player.stop();
        h.player.close();
        assert_eq!(h.store.records()[0].duration_ms, 8_000);
        assert_eq!(h.store.records().len(), 1);
    }

    #[test]
    fn wake_lock_follows_running_and_paused() {
        let mut h = harness("box", 300, VoiceSettings::default());
        assert!(!h.wake.is_held());
        h.player.begin();
        assert!(h.wake.is_held());
        h.player.pause();
        assert!(!h.wake.is_held());
        h.player.resume();
        assert!(h.wake.is_held());
        h.player.close();
        assert!(!h.wake.is_held());
    }

    #[test]
    fn ambient_is_gated_by_guided_meditation() {
        let mut h = harness("box", 300, VoiceSettings::default());
        h.player.begin();
        assert_eq!(h.ambient.playing(), Some((AmbientMode::Rain, 0.4)));
        h.player.set_guided_enabled(false);
        assert_eq!(h.ambient.playing(), None);
        h.player.set_guided_enabled(true);
        h.player.set_ambient_mode(AmbientMode::Waves);
        assert_eq!(h.ambient.playing(), Some((AmbientMode::Waves, 0.4)));
        h.player.close();
        assert_eq!(h.ambient.playing(), None);
    }

    #[test]
    fn countdown_announces_numerals_then_starts() {
        let mut h = harness("box", 300, VoiceSettings::default());
        h.player = h.player.with_countdown(3);
        let events = h.player.begin();
        assert!(matches!(events[..], [Event::CountdownTick { remaining: 3, .. }]));
        assert!(h.player.in_countdown());
        assert!(!h.player.engine().state().is_running);

        let events = run_for(&mut h, 3);
        assert!(events.iter().any(|e| matches!(e, Event::SessionStarted { .. })));
        assert!(!h.player.in_countdown());
        assert_eq!(
            h.speech.spoken_texts(),
            vec!["3", "2", "1", "Breathe in"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
        // Countdown time is not practice time.
        assert!(h.player.engine().state().total_elapsed < 0.2);
    }

    #[test]
    fn pausing_during_countdown_holds_it_until_resume() {
        let mut h = harness("box", 300, VoiceSettings::default());
        h.player = h.player.with_countdown(3);
        h.player.begin();
        h.clock.advance_ms(500);
        h.player.tick();

        assert!(matches!(h.player.pause(), Some(Event::SessionPaused { .. })));
        assert!(h.player.pause().is_none());
        assert!(h.player.in_countdown());
        assert!(!h.player.is_active());
        assert!(!h.wake.is_held());
        assert_eq!(h.speech.cancel_count(), 1);

        run_for(&mut h, 20);
        assert!(!h.player.engine().state().is_running);
        assert_eq!(h.player.countdown_remaining(), Some(3));

        assert!(matches!(h.player.resume(), Some(Event::SessionResumed { .. })));
        assert!(h.player.is_active());
        assert!(h.wake.is_held());
        let events = run_for(&mut h, 3);
        assert!(events.iter().any(|e| matches!(e, Event::SessionStarted { .. })));
        assert!(h.player.engine().state().is_running);

        run_for(&mut h, 300);
        assert_eq!(h.store.records().len(), 1);
        assert_eq!(h.store.records()[0].duration_ms, 300_000);
    }

    #[test]
    fn stopping_during_countdown_cancels_it() {
        let mut h = harness("box", 300, VoiceSettings::default());
        h.player = h.player.with_countdown(3);
        h.player.begin();
        h.player.stop();
        assert!(!h.player.in_countdown());
        assert!(!h.player.is_active());
        run_for(&mut h, 5);
        assert!(!h.player.engine().state().is_running);
        h.player.close();
        assert!(h.store.records().is_empty());
    }

    #[test]
    fn muted_session_still_advances_and_records() {
        let mut h = harness("478", 60, VoiceSettings::new(false, 80));
        h.player.begin();
        run_for(&mut h, 5);
        assert_eq!(h.player.engine().state().phase, Phase::HoldTop);
        run_for(&mut h, 60);
        assert!(h.speech.spoken_texts().is_empty());
        assert_eq!(h.store.records().len(), 1);
    }

    #[test]
    fn remaining_time_and_formatting() {
        let mut h = harness("box", 90, VoiceSettings::default());
        h.player.begin();
        run_for(&mut h, 25);
        assert!((h.player.session_remaining_secs() - 65.0).abs() < 1e-6);
        assert_eq!(format_countdown(h.player.session_remaining_secs()), "01:05");
        assert_eq!(format_countdown(-3.0), "00:00");
        assert_eq!(format_countdown(f64::NAN), "00:00");
    }

    #[test]
    fn snapshot_carries_session_target() {
        let mut h = harness("box", 120, VoiceSettings::default());
        h.player.begin();
        match h.player.snapshot() {
            Event::StateSnapshot {
                target_secs,
                session_remaining_secs,
                ..
            } => {
                assert_eq!(target_secs, Some(120));
                assert_eq!(session_remaining_secs, Some(120.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
