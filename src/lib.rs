//! nhcommunity - Community Chat Backend
//!
//! Real-time direct messaging for the nhcommunity platform. Authenticated
//! users hold one or more WebSocket connections; a hub routes private
//! messages between them after the chat service has stored each message.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared by every layer
//!   - Wire envelope, conversation and message structures
//!   - REST response wrapper
//!   - Error types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP server and WebSocket upgrade
//!   - Hub registry, client session read/write pumps
//!   - Chat service over SQLite
//!   - JWT authentication boundary
//!
//! # Feature Flags
//!
//! - **`ssr`** - Enables the backend (axum, jsonwebtoken, tracing-subscriber)
//!
//! # Usage
//!
//! ```rust,no_run
//! use nhcommunity::backend::server::{config::ServerConfig, init::create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let app = create_app(config).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - The hub registry is owned by a single task; everything else talks to
//!   it through the cloneable [`backend::realtime::Hub`] handle.
//! - Each connection runs one read pump and one write pump, joined only by
//!   a bounded outbound queue.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
