use clap::Subcommand;
use zenbreathe_core::Config;

#[derive(Subcommand)]
pub enum PatternsAction {
    /// List presets and custom patterns
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one pattern
    Show {
        /// Pattern id
        id: String,
    },
}

pub fn run(action: PatternsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        PatternsAction::List { json } => {
            let patterns = config.patterns();
            if json {
                println!("{}", serde_json::to_string_pretty(&patterns)?);
                return Ok(());
            }
            for p in patterns {
                println!(
                    "{:<10} {:<20} {:<9} {:.1} breaths/min",
                    p.id,
                    p.name,
                    p.timing_label(),
                    p.breaths_per_minute()
                );
            }
        }
        PatternsAction::Show { id } => {
            let pattern = config.find_pattern(&id)?;
            let mut json = serde_json::to_value(&pattern)?;
            if let Some(obj) = json.as_object_mut() {
                obj.insert("cycleLengthSecs".into(), pattern.cycle_length_secs().into());
                obj.insert("breathsPerMinute".into(), pattern.breaths_per_minute().into());
            }
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}
