use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inbound messages for the ledger's update loop.
///
/// The step source and the profile both send on the same channel, so
/// readings and goal changes are applied in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// Latest cumulative count for the calendar day of `at`.
    Steps { steps: i64, at: DateTime<Local> },
    /// The profile's daily goal changed.
    GoalChanged { goal: i64 },
    /// Stop the loop and hand the ledger back.
    Shutdown,
}

impl StepEvent {
    /// A reading taken now.
    pub fn steps_now(steps: i64) -> Self {
        StepEvent::Steps {
            steps,
            at: Local::now(),
        }
    }
}

/// Every ledger state change produces an Event.
/// UI layers subscribe to these instead of polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    /// The record for `date` now holds `steps`.
    StepsUpdated {
        date: NaiveDate,
        steps: u64,
        goal_met: bool,
    },
    /// First reading for a new calendar day.
    DayStarted { date: NaiveDate },
    StreakChanged { from: u32, to: u32 },
    GoalChanged { goal: u32 },
    /// In-memory state is ahead of the store; the next successful save catches up.
    PersistFailed { message: String },
    /// Input was refused and nothing changed.
    Rejected { message: String },
}
