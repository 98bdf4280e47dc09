/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server.
 * These errors are returned from HTTP handlers and converted to JSON
 * responses (see `conversion`).
 *
 * # Error Categories
 *
 * ## Handler Errors
 *
 * Raised directly by handlers with an explicit status:
 * - Authorization failures (not a participant)
 * - Invalid request values
 *
 * ## Chat Errors
 *
 * Storage failures from the chat service. Client mistakes (self
 * conversation, unknown conversation, invalid ids) map to 4xx; database
 * failures map to 500 with a generic message.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::chat::ChatError;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use axum::http::StatusCode;
/// use nhcommunity::backend::error::BackendError;
///
/// let err = BackendError::handler(StatusCode::FORBIDDEN, "Not a participant in this conversation");
/// assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., forbidden access, invalid request)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Chat storage error
    #[error(transparent)]
    Chat(#[from] ChatError),

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `Chat` - 400 / 404 for client mistakes, 500 for storage failures
    /// - `SharedError` - 400 for validation, 500 for serialization
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::Chat(err) => match err {
                ChatError::SelfConversation | ChatError::InvalidId(_) | ChatError::Validation(_) => {
                    StatusCode::BAD_REQUEST
                }
                ChatError::ConversationNotFound(_) => StatusCode::NOT_FOUND,
                ChatError::Database(_) | ChatError::Migration(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            },
        }
    }

    /// Get the error message shown to the client
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::Chat(ChatError::Database(_)) | Self::Chat(ChatError::Migration(_)) => {
                "Internal server error".to_string()
            }
            Self::Chat(err) => err.to_string(),
            Self::SharedError(err) => err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error() {
        let error = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
        match error {
            BackendError::HandlerError { status, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "Invalid request");
            }
            _ => panic!("Expected HandlerError"),
        }
    }

    #[test]
    fn test_chat_status_code_mapping() {
        let cases = [
            (ChatError::SelfConversation, StatusCode::BAD_REQUEST),
            (ChatError::InvalidId(u64::MAX), StatusCode::BAD_REQUEST),
            (ChatError::ConversationNotFound(4), StatusCode::NOT_FOUND),
            (
                ChatError::Database(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (chat_error, expected) in cases {
            assert_eq!(BackendError::from(chat_error).status_code(), expected);
        }
    }

    #[test]
    fn test_database_details_are_hidden() {
        let error = BackendError::from(ChatError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(error.message(), "Internal server error");
    }

    #[test]
    fn test_every_variant_maps_to_a_status() {
        let errors = [
            BackendError::handler(StatusCode::FORBIDDEN, "no"),
            BackendError::from(ChatError::SelfConversation),
            BackendError::from(SharedError::serialization("bad json")),
        ];
        let statuses: Vec<StatusCode> = errors.iter().map(BackendError::status_code).collect();
        assert_eq!(
            statuses,
            vec![
                StatusCode::FORBIDDEN,
                StatusCode::BAD_REQUEST,
                StatusCode::INTERNAL_SERVER_ERROR
            ]
        );
    }

    #[test]
    fn test_from_shared_error() {
        let backend_error: BackendError = SharedError::validation("field", "message").into();
        assert_eq!(backend_error.status_code(), StatusCode::BAD_REQUEST);
        assert!(backend_error.message().contains("field"));
    }
}
