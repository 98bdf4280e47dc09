/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Groups
 *
 * 1. Public: `GET /health` and the chat socket `GET /api/ws/chat`, which
 *    authenticates during the handshake itself
 * 2. Protected: the chat REST routes, behind `auth_middleware`
 *
 * # Layers
 *
 * `TraceLayer` logs every request; `CorsLayer` admits the configured
 * client origin.
 */

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::backend::middleware::auth_middleware;
use crate::backend::realtime::handle_chat_socket;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let protected = configure_api_routes(Router::new())
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/ws/chat", get(handle_chat_socket))
        .merge(protected)
        .fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&app_state.config.client_origin)),
        )
        .with_state(app_state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    match HeaderValue::from_str(origin) {
        Ok(origin) => layer.allow_origin(origin).allow_credentials(true),
        Err(_) => {
            tracing::warn!("CLIENT_ORIGIN {:?} is not a valid header value, allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}
