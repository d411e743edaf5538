//! Error types for the storage layer

use std::fmt;
use thiserror::Error;

use crate::error::{ErrorCode, MarketError};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique key already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Row changed since it was read
    #[error("Stale write: {0}")]
    Stale(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),
}

impl StorageError {
    /// Create a serialization error
    pub fn serialization<E: fmt::Display>(err: E) -> Self {
        Self::Serialization(err.to_string())
    }

    /// Create a database error
    pub fn database<E: fmt::Display>(err: E) -> Self {
        Self::Database(err.to_string())
    }

    /// Create a not found error
    pub fn not_found<E: fmt::Display>(item: E) -> Self {
        Self::NotFound(item.to_string())
    }

    /// Create a conflict error
    pub fn conflict<E: fmt::Display>(msg: E) -> Self {
        Self::Conflict(msg.to_string())
    }

    /// Create a stale write error
    pub fn stale<E: fmt::Display>(msg: E) -> Self {
        Self::Stale(msg.to_string())
    }

    /// Create a configuration error
    pub fn configuration<E: fmt::Display>(msg: E) -> Self {
        Self::Configuration(msg.to_string())
    }

    /// Create a connection error
    pub fn connection<E: fmt::Display>(msg: E) -> Self {
        Self::Connection(msg.to_string())
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err)
    }
}

/// Convert StorageError to MarketError
impl From<StorageError> for MarketError {
    fn from(err: StorageError) -> Self {
        let code = match &err {
            StorageError::Serialization(_) => ErrorCode::STORAGE_SERIALIZATION_ERROR,
            StorageError::Database(_) => ErrorCode::STORAGE_BACKEND_ERROR,
            StorageError::NotFound(_) => ErrorCode::STORAGE_NOT_FOUND,
            StorageError::Conflict(_) => ErrorCode::STORAGE_ALREADY_EXISTS,
            StorageError::Stale(_) => ErrorCode::STORAGE_STALE_WRITE,
            StorageError::Configuration(_) => ErrorCode::STORAGE_BACKEND_ERROR,
            StorageError::Connection(_) => ErrorCode::STORAGE_CONNECTION_ERROR,
        };

        let message = match &err {
            StorageError::NotFound(item) => format!("{} not found", item),
            StorageError::Conflict(msg) | StorageError::Stale(msg) => msg.clone(),
            other => other.to_string(),
        };

        MarketError::storage_with_code(code, message).with_source(err)
    }
}
