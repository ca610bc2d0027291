//! Core error types for goalr-core.
//!
//! Every error in this crate is recoverable at the application level:
//! bad input is rejected before any mutation, storage failures are
//! reported as warnings, and corrupt persisted state degrades to an
//! empty history.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for goalr-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Caller contract violation (negative steps, zero goal, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// The progress store could not be read or written
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// Stored data under `key` could not be decoded
    #[error("Corrupt persisted state under '{key}': {message}")]
    CorruptPersistedState { key: String, message: String },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// No error produced by this crate should bring the application down.
    pub fn is_fatal(&self) -> bool {
        false
    }

    /// True when the in-memory state was updated but could not be stored.
    pub fn is_persistence(&self) -> bool {
        matches!(self, CoreError::Persistence(_))
    }
}

/// Progress store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing database failed
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Backing file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored value was never read, so overwriting it could lose data
    #[error("Refusing to overwrite '{key}' that could not be read: {message}")]
    NotLoaded { key: String, message: String },

    /// The store refused the write
    #[error("Store rejected write for '{key}': {message}")]
    Rejected { key: String, message: String },
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown or mistyped configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Step readings are absolute counts and cannot be negative
    #[error("Step count must be non-negative, got {0}")]
    NegativeSteps(i64),

    /// Goals must be positive
    #[error("Daily goal must be positive, got {0}")]
    NonPositiveGoal(i64),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseBusy
                    || err.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
