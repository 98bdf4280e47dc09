/**
 * Authentication Middleware
 *
 * Protects the chat REST routes. The middleware pulls the bearer token
 * out of the `Authorization` header, verifies it with the configured
 * secret and stores an `AuthenticatedUser` in the request extensions,
 * where handlers pick it up through the `AuthUser` extractor.
 *
 * The WebSocket upgrade does its own check (see `realtime::subscription`)
 * because an unauthorized socket must still be upgraded and then closed.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::backend::auth::sessions::verify_token;
use crate::backend::server::state::AppState;
use crate::shared::messaging::UserId;

/// Authenticated user data extracted from JWT token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
}

/// Get the token from a `Bearer` authorization header
///
/// The scheme is matched case-insensitively (`bearer`, `BEARER`).
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

/// Verify `token` and turn its claims into an `AuthenticatedUser`
pub fn authenticate(secret: &str, token: &str) -> Result<AuthenticatedUser, StatusCode> {
    let claims = verify_token(secret, token).map_err(|e| {
        tracing::warn!("Invalid token: {:?}", e);
        StatusCode::UNAUTHORIZED
    })?;

    Ok(AuthenticatedUser {
        user_id: claims.user_id,
        email: claims.email,
    })
}

/// Authentication middleware
///
/// This middleware:
/// 1. Extracts JWT token from Authorization header
/// 2. Verifies the token
/// 3. Attaches user data to request extensions for use in handlers
///
/// Returns 401 Unauthorized if token is missing or invalid
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        tracing::warn!("Missing or malformed Authorization header");
        StatusCode::UNAUTHORIZED
    })?;

    let user = authenticate(&app_state.config.jwt_secret, token)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Axum extractor for authenticated user
///
/// This can be used as a parameter in handlers to automatically extract
/// the authenticated user from request extensions.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                StatusCode::UNAUTHORIZED
            })?;

        Ok(AuthUser(user))
    }
}
