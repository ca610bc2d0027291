//! Per-day step records and the bounded rolling history.
//!
//! A [`ProgressHistory`] holds at most one [`DailyRecord`] per calendar day,
//! sorted by date ascending, and never more than `window` records. Older
//! days are evicted first and cannot be recovered.

mod streak;
mod summary;

pub use streak::{GapPolicy, StreakCalculator};
pub use summary::{daily_percent, format_steps, DayProgress, WeeklySummary};

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Number of days retained by default.
pub const HISTORY_WINDOW: usize = 30;

/// Calendar day of `at` in its own timezone (midnight-aligned, no time of day).
pub fn calendar_day<Tz: TimeZone>(at: &DateTime<Tz>) -> NaiveDate {
    at.date_naive()
}

/// Today's calendar day in the local timezone.
pub fn today() -> NaiveDate {
    calendar_day(&Local::now())
}

/// Steps attributed to one calendar day.
///
/// Persisted as `{"date": "2026-10-18", "steps": 4200, "goalMet": true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub steps: u64,
    /// `steps >= goal` for the goal in effect when the record was last written.
    pub goal_met: bool,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, steps: u64, goal: u32) -> Self {
        Self {
            date,
            steps,
            goal_met: steps >= u64::from(goal),
        }
    }
}

/// What an upsert did to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A new day was added.
    Inserted,
    /// An existing day was overwritten; holds the replaced record.
    Replaced(DailyRecord),
    /// The day is older than every retained day in a full window and was
    /// dropped right away.
    Evicted,
}

/// Sliding window of daily records, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressHistory {
    records: Vec<DailyRecord>,
    window: usize,
}

impl Default for ProgressHistory {
    fn default() -> Self {
        Self::new(HISTORY_WINDOW)
    }
}

impl ProgressHistory {
    /// Empty history keeping at most `window` days (a window of 0 is treated as 1).
    pub fn new(window: usize) -> Self {
        Self {
            records: Vec::new(),
            window: window.max(1),
        }
    }

    /// Build a history from arbitrary records.
    ///
    /// Sorts by date, keeps the last occurrence of a duplicated day and
    /// trims to the window, so the invariants hold whatever the input.
    pub fn from_records(records: impl IntoIterator<Item = DailyRecord>, window: usize) -> Self {
        let mut history = Self::new(window);
        let mut records: Vec<DailyRecord> = records.into_iter().collect();
        // Stable sort keeps insertion order among equal dates.
        records.sort_by_key(|r| r.date);
        for record in records {
            match history.records.last_mut() {
                Some(last) if last.date == record.date => *last = record,
                _ => history.records.push(record),
            }
        }
        history.trim();
        history
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records sorted by date ascending (most recent last).
    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&DailyRecord> {
        self.records.last()
    }

    /// Record for `date`, if retained. Never synthesizes an empty record.
    pub fn get(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// Set the step count for `date` (absolute replace), then trim.
    pub fn upsert(&mut self, date: NaiveDate, steps: u64, goal: u32) -> Upsert {
        let record = DailyRecord::new(date, steps, goal);
        let outcome = match self.records.binary_search_by_key(&date, |r| r.date) {
            Ok(idx) => {
                let previous = std::mem::replace(&mut self.records[idx], record);
                Upsert::Replaced(previous)
            }
            Err(idx) => {
                self.records.insert(idx, record);
                Upsert::Inserted
            }
        };
        self.trim();
        if self.get(date).is_none() {
            return Upsert::Evicted;
        }
        outcome
    }

    /// Change the window, evicting the oldest days if it shrank.
    pub fn set_window(&mut self, window: usize) {
        self.window = window.max(1);
        self.trim();
    }

    fn trim(&mut self) {
        if self.records.len() > self.window {
            let excess = self.records.len() - self.window;
            self.records.drain(..excess);
        }
    }

    /// JSON array of records, oldest first.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.records)
    }

    /// Parse a stored JSON array. Fails with [`CoreError::CorruptPersistedState`].
    pub fn decode(bytes: &[u8], window: usize, key: &str) -> Result<Self, CoreError> {
        let records: Vec<DailyRecord> =
            serde_json::from_slice(bytes).map_err(|e| CoreError::CorruptPersistedState {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::from_records(records, window))
    }
}
