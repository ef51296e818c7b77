use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use tokio::io::{AsyncBufReadExt, BufReader};
use zenbreathe_core::breath::parse_target_duration;
use zenbreathe_core::platform::NoWakeLock;
use zenbreathe_core::session::format_countdown;
use zenbreathe_core::{
    BreathingPattern, Config, CueDispatcher, Database, Event, SessionDriver, SessionPlayer,
    SystemClock,
};

use crate::terminal::{TerminalAmbient, TerminalHaptics, TerminalSpeech};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run a live session. Type p, r, s or q and Enter to pause, resume,
    /// show status or quit.
    Run {
        /// Preset or custom pattern id
        #[arg(long, conflicts_with = "pattern_json")]
        pattern: Option<String>,
        /// Pattern as JSON ({"id","name","inhale","holdTop","exhale","holdBottom"})
        #[arg(long)]
        pattern_json: Option<String>,
        /// Session length in seconds (30 to 3600)
        #[arg(long)]
        duration: Option<String>,
        /// Spoken countdown before the first phase, in seconds
        #[arg(long)]
        countdown: Option<u32>,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Run {
            pattern,
            pattern_json,
            duration,
            countdown,
            json,
        } => {
            let config = Config::load()?;
            let pattern = match pattern_json {
                Some(raw) => BreathingPattern::from_json(&raw)?,
                None => config.find_pattern(pattern.as_deref().unwrap_or("equal"))?,
            };
            let db = Database::open()?;
            let target_secs = match duration {
                Some(raw) => parse_target_duration(Some(&raw)),
                None => db.exercise_duration(&pattern.id)?,
            };

            let cues = CueDispatcher::new(
                config.voice_settings(),
                Box::new(TerminalSpeech::new(json)),
                Box::new(TerminalHaptics::new(json)),
            )
            .with_pulse_ms(config.haptics.pulse_ms);

            if !json {
                println!(
                    "{} ({}), {} session. p=pause r=resume s=status q=quit",
                    pattern.name,
                    pattern.timing_label(),
                    format_countdown(target_secs as f64)
                );
            }

            let player = SessionPlayer::new(
                pattern,
                target_secs,
                Arc::new(SystemClock),
                cues,
                Box::new(db),
            )
            .with_countdown(countdown.unwrap_or(config.session.countdown_secs))
            .with_wake_lock(Box::new(NoWakeLock))
            .with_ambient(
                Box::new(TerminalAmbient::new(json)),
                config.ambient.mode,
                config.ambient.volume,
            );

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let tick = Duration::from_millis(config.session.tick_interval_ms);
            let result = runtime.block_on(drive(player, tick, json));
            // A pending stdin read would otherwise hold shutdown until the next line.
            runtime.shutdown_background();
            result
        }
    }
}

async fn drive(
    player: SessionPlayer,
    tick: Duration,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (driver, mut events) = SessionDriver::new(player, tick);
    driver.start().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                let finished = matches!(event, Event::AutoStopped { .. });
                print_event(&event, json)?;
                if finished {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match line.trim() {
                    "p" => driver.pause().await,
                    "r" => driver.resume().await,
                    "s" => print_event(&driver.snapshot().await, json)?,
                    "q" => break,
                    "" => {}
                    other => eprintln!("unknown input '{other}' (p, r, s, q)"),
                },
                Ok(None) | Err(_) => stdin_open = false,
            },
        }
    }

    driver.close().await;
    while let Ok(event) = events.try_recv() {
        print_event(&event, json)?;
    }
    Ok(())
}

fn print_event(event: &Event, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        Event::CountdownTick { remaining, .. } => println!("starting in {remaining}"),
        Event::SessionStarted {
            phase,
            duration_secs,
            ..
        }
        | Event::PhaseEntered {
            phase,
            duration_secs,
            ..
        } => println!("{:<12} {duration_secs}s", phase.label()),
        Event::SessionPaused { time_remaining, .. } => {
            println!("paused, {time_remaining:.1}s left in this phase")
        }
        Event::SessionResumed { .. } => println!("resumed"),
        Event::SessionStopped { total_elapsed, .. } => {
            println!("stopped after {}", format_countdown(*total_elapsed))
        }
        Event::AutoStopped { .. } => println!("session complete"),
        Event::SessionRecorded {
            exercise_name,
            duration_ms,
            ..
        } => println!(
            "saved {exercise_name}, {}",
            format_countdown(*duration_ms as f64 / 1000.0)
        ),
        Event::StateSnapshot {
            state,
            session_remaining_secs,
            ..
        } => println!(
            "{} {:.1}s, elapsed {}, remaining {}",
            state.phase.label(),
            state.time_remaining,
            format_countdown(state.total_elapsed),
            format_countdown(session_remaining_secs.unwrap_or(0.0))
        ),
    }
    Ok(())
}
