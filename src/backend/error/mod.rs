//! Backend Error Module
//!
//! This module defines error types specific to the backend server.
//! These errors are used in HTTP handlers and can be converted to HTTP responses.
//!
//! # Architecture
//!
//! - **`types`** - Error type definitions and constructors
//! - **`conversion`** - `IntoResponse` for `BackendError`
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - Error conversion implementations
//! ```
//!
//! # Error Types
//!
//! - `HandlerError` - Errors raised by HTTP handlers with an explicit status
//! - `Chat` - Errors from the chat service
//! - `SharedError` - Errors from the shared module
//!
//! WebSocket frames never produce a `BackendError`; the session logs and
//! drops them instead.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::BackendError;
