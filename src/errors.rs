//! Error types for the Wordmint backend
//!
//! Every core operation fails with one of these; failures are terminal and
//! synchronous, scoped to the single request. Store-level faults are
//! propagated unchanged for the boundary layer to decide on retry policy.

use rust_decimal::Decimal;
use std::error::Error as StdError;
use std::fmt;

/// Root error type for all Wordmint operations
#[derive(Debug)]
pub enum WordmintError {
    /// Malformed or out-of-range caller data
    InvalidInput(String),

    /// Referenced entity absent or not owned by the caller
    NotFound(String),

    /// Operation not legal in the current lifecycle state
    InvalidState(String),

    /// Payout admission guard; carries the computed available amount
    InsufficientBalance { available: Decimal },

    /// Backing store errors
    Storage(StorageError),

    /// Configuration related errors
    Configuration(ConfigurationError),
}

/// Storage system errors
#[derive(Debug)]
pub enum StorageError {
    DatabaseOpenFailed(String),
    ReadFailed(String),
    WriteFailed(String),
    CorruptedData(String),
}

/// Configuration and validation errors
#[derive(Debug)]
pub enum ConfigurationError {
    ValidationFailed(String),
    MissingRequired(String),
    InvalidValue { field: String, value: String, reason: String },
    LoadFailed(String),
    SaveFailed(String),
}

impl fmt::Display for WordmintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordmintError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            WordmintError::NotFound(msg) => write!(f, "Not found: {}", msg),
            WordmintError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            WordmintError::InsufficientBalance { available } => {
                write!(f, "Insufficient balance. Available: {:.2}", available)
            }
            WordmintError::Storage(e) => write!(f, "Storage error: {}", e),
            WordmintError::Configuration(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DatabaseOpenFailed(msg) => write!(f, "Database open failed: {}", msg),
            StorageError::ReadFailed(msg) => write!(f, "Read failed: {}", msg),
            StorageError::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
            StorageError::CorruptedData(msg) => write!(f, "Corrupted data: {}", msg),
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
            ConfigurationError::MissingRequired(field) => write!(f, "Missing required field: {}", field),
            ConfigurationError::InvalidValue { field, value, reason } => {
                write!(f, "Invalid value for {}: '{}' ({})", field, value, reason)
            }
            ConfigurationError::LoadFailed(msg) => write!(f, "Failed to load configuration: {}", msg),
            ConfigurationError::SaveFailed(msg) => write!(f, "Failed to save configuration: {}", msg),
        }
    }
}

impl StdError for WordmintError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            WordmintError::Storage(e) => Some(e),
            WordmintError::Configuration(e) => Some(e),
            _ => None,
        }
    }
}

impl StdError for StorageError {}
impl StdError for ConfigurationError {}

impl From<StorageError> for WordmintError {
    fn from(e: StorageError) -> Self {
        WordmintError::Storage(e)
    }
}

impl From<ConfigurationError> for WordmintError {
    fn from(e: ConfigurationError) -> Self {
        WordmintError::Configuration(e)
    }
}

impl From<rocksdb::Error> for WordmintError {
    fn from(e: rocksdb::Error) -> Self {
        WordmintError::Storage(StorageError::WriteFailed(e.to_string()))
    }
}

/// Convenience type alias for Results
pub type WordmintResult<T> = Result<T, WordmintError>;
