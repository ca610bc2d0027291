pub mod config;
pub mod profile;
pub mod progress;
pub mod steps;

use goalr_core::{Config, Database, Ledger, LedgerOptions, LoadStatus};

/// Open the on-disk ledger the way the app does at startup.
pub fn open_ledger() -> Result<Ledger<Database>, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let (ledger, status) = Ledger::open(db, LedgerOptions::from_config(&config));
    match &status {
        LoadStatus::Recovered { reason } => {
            eprintln!("warning: stored progress was unreadable and has been reset ({reason})");
        }
        LoadStatus::Unavailable { reason } => {
            eprintln!("warning: could not read stored progress, changes will not be saved ({reason})");
        }
        _ => {}
    }
    tracing::debug!(?status, "ledger ready");
    Ok(ledger)
}
