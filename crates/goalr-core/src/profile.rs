//! User profile and daily goal.
//!
//! The profile owns the goal; the ledger only reads it.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ValidationError};
use crate::storage::{ProgressStore, USER_KEY};

/// Goal used when no profile has been registered.
pub const DEFAULT_DAILY_GOAL: u32 = 4000;

/// Range offered by the goal picker. Any positive goal is accepted.
pub const GOAL_PICKER_RANGE: RangeInclusive<u32> = 3000..=15000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub username: String,
    pub daily_goal: u32,
}

impl UserProfile {
    /// # Errors
    /// Fails with `InvalidArgument` on an empty name or a zero goal.
    pub fn new(name: &str, username: &str, daily_goal: u32) -> Result<Self, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".into(),
                message: "must not be empty".into(),
            }
            .into());
        }
        validate_goal(i64::from(daily_goal))?;
        Ok(Self {
            name: name.to_string(),
            username: username.trim().to_string(),
            daily_goal,
        })
    }

    pub fn level(&self) -> GoalLevel {
        GoalLevel::for_goal(self.daily_goal)
    }

    /// Read the stored profile. `Ok(None)` when nothing is stored.
    ///
    /// # Errors
    /// `Persistence` if the store fails, `CorruptPersistedState` if the
    /// stored value cannot be decoded.
    pub fn load<S: ProgressStore + ?Sized>(store: &S) -> Result<Option<Self>, CoreError> {
        let Some(bytes) = store.get(USER_KEY)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| CoreError::CorruptPersistedState {
                key: USER_KEY.to_string(),
                message: e.to_string(),
            })
    }

    pub fn save<S: ProgressStore + ?Sized>(&self, store: &mut S) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec(self)?;
        store.set(USER_KEY, &bytes)?;
        Ok(())
    }
}

/// Reject non-positive goals.
pub fn validate_goal(goal: i64) -> Result<u32, ValidationError> {
    if goal <= 0 {
        return Err(ValidationError::NonPositiveGoal(goal));
    }
    u32::try_from(goal).map_err(|_| ValidationError::InvalidValue {
        field: "daily_goal".into(),
        message: format!("{goal} is too large"),
    })
}

/// Difficulty band shown next to a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalLevel {
    GettingStarted,
    Recommended,
    Active,
    Challenging,
    Elite,
    Custom,
}

impl GoalLevel {
    pub fn for_goal(goal: u32) -> Self {
        match goal {
            3000..=4900 => GoalLevel::GettingStarted,
            5000..=7000 => GoalLevel::Recommended,
            7001..=10000 => GoalLevel::Active,
            10001..=12000 => GoalLevel::Challenging,
            12001.. => GoalLevel::Elite,
            _ => GoalLevel::Custom,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GoalLevel::GettingStarted => "Getting Started",
            GoalLevel::Recommended => "Recommended",
            GoalLevel::Active => "Active",
            GoalLevel::Challenging => "Challenging",
            GoalLevel::Elite => "Elite",
            GoalLevel::Custom => "Custom",
        }
    }
}

/// A one-tap goal option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GoalPreset {
    pub steps: u32,
    pub title: &'static str,
    pub description: &'static str,
}

pub const GOAL_PRESETS: [GoalPreset; 5] = [
    GoalPreset {
        steps: 3000,
        title: "Getting Started",
        description: "Perfect for beginners",
    },
    GoalPreset {
        steps: 5000,
        title: "Recommended",
        description: "Health experts' choice",
    },
    GoalPreset {
        steps: 8000,
        title: "Active",
        description: "For fitness enthusiasts",
    },
    GoalPreset {
        steps: 10000,
        title: "Challenging",
        description: "Push your limits",
    },
    GoalPreset {
        steps: 12000,
        title: "Elite",
        description: "For champions",
    },
];
