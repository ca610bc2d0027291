mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, LedgerConfig, ProfileConfig, StreakConfig};
pub use database::Database;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{ConfigError, StoreError};

/// Store key holding the JSON array of daily records.
pub const PROGRESS_KEY: &str = "progress";
/// Store key holding the user profile.
pub const USER_KEY: &str = "user";

/// Returns the data directory, creating it if needed.
///
/// `GOALR_DATA_DIR` wins when set. Otherwise `~/.config/goalr`, or
/// `~/.config/goalr-dev` with `GOALR_ENV=dev`.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("GOALR_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("GOALR_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("goalr-dev")
            } else {
                base_dir.join("goalr")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Durable mapping from string keys to opaque blobs.
///
/// `set` must be atomic: after a failed or interrupted write the key
/// still holds its previous value.
pub trait ProgressStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

/// In-process store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

impl<S: ProgressStore + ?Sized> ProgressStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}
