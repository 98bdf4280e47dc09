//! Middleware Module
//!
//! HTTP middleware for the backend server.
//!
//! - **`auth`** - JWT authentication for the REST routes
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::middleware::from_fn_with_state;
//! use nhcommunity::backend::middleware::auth_middleware;
//!
//! // let protected = routes.route_layer(from_fn_with_state(state.clone(), auth_middleware));
//! ```

pub mod auth;

pub use auth::{auth_middleware, authenticate, bearer_token, AuthUser, AuthenticatedUser};
