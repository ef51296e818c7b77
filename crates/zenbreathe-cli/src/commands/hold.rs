use std::io::BufRead;
use std::sync::Arc;

use clap::Subcommand;
use zenbreathe_core::breath::format_hold;
use zenbreathe_core::{BreathHoldTimer, Database, SystemClock};

#[derive(Subcommand, Default)]
pub enum HoldAction {
    /// Time a breath hold (Enter to start, Enter to stop)
    #[default]
    Start,
    /// Show the longest recorded hold
    Best,
}

pub fn run(action: HoldAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        HoldAction::Start => {
            let best = db.best_breath_hold()?.unwrap_or(0);
            println!("all-time record: {}", format_hold(best));
            println!("press Enter to start holding");

            let stdin = std::io::stdin();
            let mut lines = stdin.lock().lines();
            if lines.next().transpose()?.is_none() {
                return Err("no input, hold not started".into());
            }

            let mut timer = BreathHoldTimer::new(Arc::new(SystemClock));
            timer.start();
            println!("holding... press Enter to stop");
            lines.next().transpose()?;

            match timer.stop() {
                Some(ms) => {
                    db.add_breath_hold_record(ms)?;
                    println!("held for {}", format_hold(ms));
                    if ms > best {
                        println!("new record!");
                    }
                }
                None => println!("nothing recorded"),
            }
        }
        HoldAction::Best => match db.best_breath_hold()? {
            Some(ms) => println!("{}", format_hold(ms)),
            None => println!("no breath holds recorded"),
        },
    }
    Ok(())
}
