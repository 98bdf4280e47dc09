//! Server Module
//!
//! Server initialization and configuration for the chat backend.
//!
//! # Architecture
//!
//! - **`state`** - Application state structure and `FromRef` implementations
//! - **`config`** - Configuration loading and validation, database setup
//! - **`init`** - Server initialization and app creation
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - ServerConfig, ChatConfig, load_database
//! └── init.rs         - Server initialization and app creation
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: `ServerConfig::from_env`
//! 2. **Database**: connect and migrate
//! 3. **Hub**: spawn the hub task
//! 4. **Router Creation**: routes, auth middleware, CORS, tracing

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

// Re-export commonly used types
pub use config::{ChatConfig, ConfigError, ServerConfig};
pub use init::create_app;
pub use state::AppState;
