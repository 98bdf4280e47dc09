//! Real-time Chat Module
//!
//! Routes private messages between connected users over WebSockets.
//!
//! # Architecture
//!
//! - **`registry`** - The user to sessions map and its delivery policy
//! - **`hub`** - The task that owns the registry, and its `Hub` handle
//! - **`session`** - Per-connection read and write pumps
//! - **`subscription`** - The `GET /api/ws/chat` upgrade handler
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── registry.rs     - Registry, SessionHandle
//! ├── hub.rs          - Hub actor
//! ├── session.rs      - ClientSession pumps
//! └── subscription.rs - WebSocket upgrade handler
//! ```
//!
//! # Message Flow
//!
//! ```text
//! frame -> read pump -> ChatService (store) -> Hub -> recipient queues -> write pumps -> frames
//! ```
//!
//! A slow recipient never holds anyone up: when its bounded queue is full
//! the hub evicts that session and moves on.

/// Session registry
pub mod registry;

/// Hub actor
pub mod hub;

/// Client session pumps
pub mod session;

/// WebSocket upgrade handler
pub mod subscription;

// Re-export commonly used types and functions
pub use hub::Hub;
pub use registry::{Registry, SessionHandle, SessionId};
pub use session::ClientSession;
pub use subscription::handle_chat_socket;
