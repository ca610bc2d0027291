use clap::Subcommand;
use goalr_core::progress::{daily_percent, format_steps, today};

use super::open_ledger;

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Retained daily records, oldest first
    History,
    /// The last seven days with totals
    Week,
    /// Today's steps, goal and streak
    Today,
}

pub fn run(action: ProgressAction) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = open_ledger()?;

    match action {
        ProgressAction::History => {
            println!("{}", serde_json::to_string_pretty(ledger.daily_progress())?);
        }
        ProgressAction::Week => {
            let week = ledger.weekly_summary(today());
            println!("{}", serde_json::to_string_pretty(&week)?);
            eprintln!(
                "{} of 7 days completed, {} steps, {} per day",
                week.completed_days,
                format_steps(week.total_steps),
                format_steps(week.average_steps)
            );
        }
        ProgressAction::Today => {
            let snapshot = ledger.snapshot();
            let out = serde_json::json!({
                "date": today(),
                "current_steps": snapshot.current_steps,
                "daily_goal": snapshot.daily_goal,
                "percent": daily_percent(snapshot.current_steps, snapshot.daily_goal),
                "streak": snapshot.streak,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

pub fn streak() -> Result<(), Box<dyn std::error::Error>> {
    let ledger = open_ledger()?;
    println!("{}", ledger.streak());
    Ok(())
}
