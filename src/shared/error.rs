//! Shared Error Types
//!
//! Errors raised while decoding, validating or encoding the wire types in
//! [`crate::shared`]. They carry no transport or storage detail, so both the
//! WebSocket pumps and the REST layer can surface them.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - A decoded value violates a field constraint
//!
//! # Usage
//!
//! ```rust
//! use nhcommunity::shared::error::SharedError;
//!
//! let error = SharedError::validation("content", "message content cannot be empty");
//! assert!(error.to_string().contains("content"));
//! ```
use thiserror::Error;

/// Errors that can occur when handling wire types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
