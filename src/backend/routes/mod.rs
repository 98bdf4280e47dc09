//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Architecture
//!
//! - **`router`** - Main router creation, middleware and layers
//! - **`api_routes`** - Authenticated chat REST endpoints
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation
//! └── api_routes.rs   - API endpoint routes
//! ```
//!
//! # Routes
//!
//! - `GET  /health` - Liveness check
//! - `GET  /api/ws/chat` - Chat WebSocket
//! - `GET  /api/conversations` - List conversations
//! - `GET  /api/conversations/{id}/messages` - Message history
//! - `POST /api/conversations/{id}/read` - Mark read
//! - `POST /api/chats` - Get or create a direct conversation

/// Main router creation
pub mod router;

/// API endpoint routes
pub mod api_routes;

// Re-export commonly used functions
pub use router::create_router;
