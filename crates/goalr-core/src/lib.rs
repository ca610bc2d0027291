//! # Goalr Core Library
//!
//! Business logic for the Goalr step tracker. The CLI (and any GUI shell)
//! is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Ledger**: owns the rolling per-day step history, applies readings
//!   as absolute daily totals and persists after every change
//! - **Streak**: pure calculation of consecutive goal-met days
//! - **Storage**: key/blob progress store (SQLite or in-memory) and
//!   TOML configuration
//! - **Service**: channel-driven single-writer loop publishing change events
//!
//! ## Key Components
//!
//! - [`Ledger`]: the daily progress ledger
//! - [`StreakCalculator`]: streak over a slice of records
//! - [`ProgressStore`]: trait for the durable store
//! - [`LedgerService`]: update loop for step sources and observers

pub mod error;
pub mod events;
pub mod ledger;
pub mod profile;
pub mod progress;
pub mod service;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, StoreError, ValidationError};
pub use events::{LedgerEvent, StepEvent};
pub use ledger::{IngestReport, Ledger, LedgerOptions, LedgerSnapshot, LoadStatus};
pub use profile::{GoalLevel, GoalPreset, UserProfile, DEFAULT_DAILY_GOAL, GOAL_PRESETS};
pub use progress::{
    DailyRecord, GapPolicy, ProgressHistory, StreakCalculator, Upsert, WeeklySummary,
    HISTORY_WINDOW,
};
pub use service::LedgerService;
pub use storage::{Config, Database, MemoryStore, ProgressStore};
