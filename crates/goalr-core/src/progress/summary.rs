//! Dashboard read models derived from the history.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::ProgressHistory;

/// Percentage of `goal` reached, capped at 100. A zero goal counts as reached.
pub fn daily_percent(steps: u64, goal: u32) -> u8 {
    if goal == 0 {
        return 100;
    }
    let pct = steps.saturating_mul(100) / u64::from(goal);
    pct.min(100) as u8
}

/// Compact step count: `4.5k` from 1000 upward, plain digits below.
pub fn format_steps(steps: u64) -> String {
    if steps >= 1000 {
        format!("{:.1}k", steps as f64 / 1000.0)
    } else {
        steps.to_string()
    }
}

/// One day in the weekly strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayProgress {
    pub date: NaiveDate,
    pub steps: u64,
    pub goal_met: bool,
    /// `steps / goal`, clamped to `0.0..=1.0`.
    pub fraction: f64,
    /// Whether a record exists for this day.
    pub recorded: bool,
}

/// The seven days ending today, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub days: Vec<DayProgress>,
    pub completed_days: u32,
    pub total_steps: u64,
    /// Integer mean over days that have a record.
    pub average_steps: u64,
}

impl WeeklySummary {
    pub fn build(history: &ProgressHistory, today: NaiveDate, goal: u32) -> Self {
        let days: Vec<DayProgress> = (0..7i64)
            .rev()
            .map(|offset| {
                let date = today - Duration::days(offset);
                match history.get(date) {
                    Some(record) => DayProgress {
                        date,
                        steps: record.steps,
                        goal_met: record.goal_met,
                        fraction: fraction(record.steps, goal),
                        recorded: true,
                    },
                    None => DayProgress {
                        date,
                        steps: 0,
                        goal_met: false,
                        fraction: 0.0,
                        recorded: false,
                    },
                }
            })
            .collect();

        let recorded = days.iter().filter(|d| d.recorded).count() as u64;
        let completed_days = days.iter().filter(|d| d.goal_met).count() as u32;
        let total_steps: u64 = days.iter().map(|d| d.steps).sum();
        let average_steps = if recorded == 0 { 0 } else { total_steps / recorded };

        Self {
            days,
            completed_days,
            total_steps,
            average_steps,
        }
    }
}

fn fraction(steps: u64, goal: u32) -> f64 {
    if goal == 0 {
        return 1.0;
    }
    (steps as f64 / f64::from(goal)).min(1.0)
}
