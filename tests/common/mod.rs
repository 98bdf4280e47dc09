//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Database test fixtures
//! - Test server helpers
//! - Authentication test helpers

#![allow(dead_code)]

pub mod auth_helpers;
pub mod database;
pub mod server;

// Re-export commonly used utilities
pub use auth_helpers::*;
pub use database::*;
pub use server::*;
