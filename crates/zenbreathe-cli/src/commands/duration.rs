use clap::Subcommand;
use zenbreathe_core::breath::parse_target_duration;
use zenbreathe_core::session::format_countdown;
use zenbreathe_core::{Config, Database};

#[derive(Subcommand)]
pub enum DurationAction {
    /// Show the session length stored for an exercise
    Get {
        /// Pattern id
        id: String,
    },
    /// Store the session length for an exercise, in seconds
    Set {
        /// Pattern id
        id: String,
        /// Seconds (30 to 3600; anything else stores 300)
        secs: f64,
    },
    /// Show every stored session length
    List,
    /// Show what a raw duration value resolves to
    Validate {
        raw: String,
    },
}

pub fn run(action: DurationAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        DurationAction::Get { id } => {
            let db = Database::open()?;
            println!("{}", db.exercise_duration(&id)?);
        }
        DurationAction::Set { id, secs } => {
            Config::load()?.find_pattern(&id)?;
            let db = Database::open()?;
            let stored = db.set_exercise_duration(&id, secs)?;
            println!("{id}: {stored}s ({})", format_countdown(stored as f64));
        }
        DurationAction::List => {
            let db = Database::open()?;
            let durations: serde_json::Map<String, serde_json::Value> = db
                .exercise_durations()?
                .into_iter()
                .map(|(id, secs)| (id, secs.into()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&durations)?);
        }
        DurationAction::Validate { raw } => {
            println!("{}", parse_target_duration(Some(&raw)));
        }
    }
    Ok(())
}
