//! Backend Module
//!
//! All server-side code for the nhcommunity chat backend: an Axum HTTP
//! server with a WebSocket chat hub and a small REST surface over the
//! same chat storage.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - Router assembly and middleware layering
//! - **`chat`** - Chat service trait, SQLite store, REST handlers
//! - **`realtime`** - Hub, session registry, client session pumps
//! - **`auth`** - JWT verification
//! - **`middleware`** - Authentication middleware and extractor
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Configuration and state
//! ├── routes/         - Route configuration
//! ├── chat/           - Chat storage and REST handlers
//! ├── realtime/       - WebSocket hub and sessions
//! ├── auth/           - JWT tokens
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # State Management
//!
//! `AppState` holds the chat service, the hub handle and the loaded
//! configuration. The registry of live sessions is not in `AppState`; it
//! is owned by the hub task and reached only through `Hub`.
//!
//! # Error Handling
//!
//! - `BackendError` for REST handlers, rendered as `{ success: false, message }`
//! - `ChatError` for storage
//! - WebSocket frame errors are logged and the frame dropped

/// Server setup and configuration
#[cfg(feature = "ssr")]
pub mod server;

/// Route configuration
#[cfg(feature = "ssr")]
pub mod routes;

/// Chat storage and REST handlers
#[cfg(feature = "ssr")]
pub mod chat;

/// Real-time chat hub
#[cfg(feature = "ssr")]
pub mod realtime;

/// Backend error types
#[cfg(feature = "ssr")]
pub mod error;

/// Authentication
#[cfg(feature = "ssr")]
pub mod auth;

/// Middleware for request processing
#[cfg(feature = "ssr")]
pub mod middleware;

/// Re-export commonly used types
#[cfg(feature = "ssr")]
pub use chat::{ChatService, SqliteChatStore};
#[cfg(feature = "ssr")]
pub use error::BackendError;
#[cfg(feature = "ssr")]
pub use realtime::{handle_chat_socket, Hub};
#[cfg(feature = "ssr")]
pub use server::create_app;
