//! Authentication test helpers
//!
//! Tokens are signed with a fixed secret that `test_config` also uses, so
//! any server built by these helpers accepts them.

#[cfg(feature = "ssr")]
use nhcommunity::backend::auth::sessions::create_token;
#[cfg(feature = "ssr")]
use nhcommunity::backend::server::ServerConfig;
#[cfg(feature = "ssr")]
use nhcommunity::shared::UserId;

/// Signing secret shared by every test server
pub const TEST_SECRET: &str = "nhcommunity-test-secret";

/// Create a valid access token for `user_id`
#[cfg(feature = "ssr")]
pub fn token_for(user_id: UserId) -> String {
    create_token(TEST_SECRET, user_id, format!("user{}@example.com", user_id), 60)
        .expect("Failed to create test token")
}

/// Token signed with a secret the server does not know
#[cfg(feature = "ssr")]
pub fn forged_token(user_id: UserId) -> String {
    create_token("not-the-server-secret", user_id, "mallory@example.com", 60)
        .expect("Failed to create forged token")
}

/// Server configuration matching `TEST_SECRET`
#[cfg(feature = "ssr")]
pub fn test_config() -> ServerConfig {
    ServerConfig::for_testing(TEST_SECRET)
}

/// `Authorization` header value for `user_id`
#[cfg(feature = "ssr")]
pub fn bearer(user_id: UserId) -> String {
    format!("Bearer {}", token_for(user_id))
}
