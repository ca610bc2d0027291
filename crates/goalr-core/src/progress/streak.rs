//! Consecutive-day goal streak.
//!
//! The walk starts at today and moves backward through the history,
//! newest first. A record with an unmet goal always ends the walk.
//! What a day *without* a record does depends on [`GapPolicy`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::DailyRecord;

/// How a calendar day with no record affects the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Missing days are skipped; only an unmet-goal record breaks the streak.
    #[default]
    Tolerant,
    /// Any missing day before today breaks the streak.
    /// Today itself may still be missing (no reading yet).
    Strict,
}

/// Streak calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct StreakCalculator {
    policy: GapPolicy,
}

impl StreakCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: GapPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> GapPolicy {
        self.policy
    }

    /// Count consecutive goal-met days ending at `today`.
    ///
    /// Records dated after `today` are ignored. Input order does not matter.
    pub fn calculate(&self, records: &[DailyRecord], today: NaiveDate) -> u32 {
        let mut sorted: Vec<&DailyRecord> = records.iter().filter(|r| r.date <= today).collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));

        let mut streak = 0u32;
        let mut expected = today;

        for record in sorted {
            if record.date < expected && !self.gap_allowed(expected, record.date, today) {
                break;
            }
            if !record.goal_met {
                break;
            }
            streak += 1;
            match record.date.pred_opt() {
                Some(prev) => expected = prev,
                None => break,
            }
        }

        streak
    }

    fn gap_allowed(&self, expected: NaiveDate, found: NaiveDate, today: NaiveDate) -> bool {
        match self.policy {
            GapPolicy::Tolerant => true,
            // Only the "no reading yet today" gap is forgiven.
            GapPolicy::Strict => expected == today && today.pred_opt() == Some(found),
        }
    }
}
