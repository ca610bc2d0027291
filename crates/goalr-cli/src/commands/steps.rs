use chrono::NaiveDate;
use clap::Subcommand;
use goalr_core::progress::today;
use goalr_core::CoreError;

use super::open_ledger;

#[derive(Subcommand)]
pub enum StepsAction {
    /// Record today's cumulative step count (replaces any earlier reading)
    Record {
        /// Step count for the day
        #[arg(allow_negative_numbers = true)]
        steps: i64,
        /// Backfill a past day instead of today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the record for a day
    Show {
        /// Day to show (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: StepsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = open_ledger()?;

    match action {
        StepsAction::Record { steps, date } => {
            let result = match date {
                Some(day) => ledger.backfill(steps, day, today()),
                None => ledger.ingest(steps),
            };
            match result {
                Ok(report) if report.record.is_none() => {
                    eprintln!(
                        "warning: that day is older than the {}-day history window and was not kept",
                        ledger.history().window()
                    );
                }
                Ok(report) => {
                    let out = serde_json::json!({
                        "record": report.record,
                        "streak": report.streak,
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                Err(e @ CoreError::Persistence(_)) => {
                    eprintln!("warning: {e}; progress kept for this session only");
                }
                Err(e) => return Err(e.into()),
            }
        }
        StepsAction::Show { date } => {
            let day = date.unwrap_or_else(today);
            match ledger.record_for(day) {
                Some(record) => println!("{}", serde_json::to_string_pretty(record)?),
                None => {
                    eprintln!("no data for {day}");
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
