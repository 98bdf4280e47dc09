//! Authentication Module
//!
//! Token verification for the chat backend. Login and signup live in
//! another service; this module only decodes what that service issues.
//!
//! - **`sessions`** - JWT claims, token creation and verification

pub mod sessions;

pub use sessions::{create_token, verify_token, Claims};
