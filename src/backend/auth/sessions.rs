/**
 * Session Tokens
 *
 * JWT encoding and validation for the authentication boundary. Tokens are
 * issued elsewhere on the platform; this crate verifies them on every REST
 * request and on the chat WebSocket handshake. `create_token` is kept for
 * tooling and tests.
 *
 * The signing secret is passed in explicitly (it comes from
 * `ServerConfig`), never read from the environment here.
 */

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::shared::messaging::UserId;

/// Issuer written into and required from every token
pub const TOKEN_ISSUER: &str = "nhcommunity";

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User ID
    pub user_id: UserId,
    /// Email
    pub email: String,
    /// "access" for session tokens
    pub token_type: String,
    /// Platform role, absent for ordinary members
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
    /// Issuer
    pub iss: String,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Create an access token for a user
///
/// # Arguments
/// * `secret` - HMAC signing secret
/// * `user_id` - User ID
/// * `email` - User email
/// * `expires_in_minutes` - Lifetime of the token
pub fn create_token(
    secret: &str,
    user_id: UserId,
    email: impl Into<String>,
    expires_in_minutes: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = unix_now();

    let claims = Claims {
        user_id,
        email: email.into(),
        token_type: "access".to_string(),
        role: None,
        exp: now + expires_in_minutes * 60,
        iat: now,
        iss: TOKEN_ISSUER.to_string(),
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key)
}

/// Verify and decode a JWT token
///
/// Rejects bad signatures, expired tokens and tokens from another issuer.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.set_issuer(&[TOKEN_ISSUER]);

    let token_data = decode::<Claims>(token, &key, &validation)?;
    Ok(token_data.claims)
}
