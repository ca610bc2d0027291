//! TOML-based application configuration.
//!
//! Stores:
//! - History retention window
//! - Streak gap policy
//! - Fallback daily goal when no profile is registered
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::progress::{GapPolicy, HISTORY_WINDOW};
use crate::profile::DEFAULT_DAILY_GOAL;

/// Ledger retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

/// Streak settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreakConfig {
    #[serde(default)]
    pub gap_policy: GapPolicy,
}

/// Profile fallbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_goal")]
    pub default_goal: u32,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
}

fn default_history_window() -> usize {
    HISTORY_WINDOW
}
fn default_goal() -> u32 {
    DEFAULT_DAILY_GOAL
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            default_goal: default_goal(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        if key.is_empty() {
            return Err(invalid("config key is empty".into()));
        }

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current
                    .get_mut(part)
                    .ok_or_else(|| invalid("unknown config key".into()))?;
                continue;
            }

            let obj = current
                .as_object_mut()
                .ok_or_else(|| invalid("unknown config key".into()))?;
            let existing = obj
                .get(part)
                .ok_or_else(|| invalid("unknown config key".into()))?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                ),
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("not a leaf key".into()));
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(invalid("unknown config key".into()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed,
    /// or if the default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path` through a sibling temp file and rename.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content).map_err(|e| save_failed(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Reject values the ledger cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.history_window == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ledger.history_window".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.profile.default_goal == 0 {
            return Err(ConfigError::InvalidValue {
                key: "profile.default_goal".into(),
                message: "must be positive".into(),
            });
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key, validate, and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value has the wrong type
    /// or fails validation, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let updated = self.with_value(key, value)?;
        updated.save()?;
        *self = updated;
        Ok(())
    }

    /// Copy of this config with `key` set to `value`, validated but not saved.
    pub fn with_value(&self, key: &str, value: &str) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        Ok(updated)
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("using default config: {e}");
            Self::default()
        })
    }
}
