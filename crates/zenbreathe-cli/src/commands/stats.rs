use chrono::Utc;
use clap::Subcommand;
use zenbreathe_core::stats::{breath_hold_chart, last_10_sessions, last_7_days_minutes, summary};
use zenbreathe_core::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Minutes practiced on each of the last 7 days
    Week,
    /// The 10 most recent sessions
    Recent,
    /// Breath-hold results over time
    Holds,
    /// All-time totals
    All,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let today = Utc::now().date_naive();

    match action {
        StatsAction::Week => {
            let sessions = db.breathing_sessions()?;
            let week = last_7_days_minutes(&sessions, today);
            println!("{}", serde_json::to_string_pretty(&week)?);
        }
        StatsAction::Recent => {
            let sessions = db.breathing_sessions()?;
            println!("{}", serde_json::to_string_pretty(&last_10_sessions(&sessions))?);
        }
        StatsAction::Holds => {
            let holds = db.breath_hold_records()?;
            println!("{}", serde_json::to_string_pretty(&breath_hold_chart(&holds))?);
        }
        StatsAction::All => {
            let sessions = db.breathing_sessions()?;
            let holds = db.breath_hold_records()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&summary(&sessions, &holds, today))?
            );
        }
    }
    Ok(())
}
