/**
 * Server Initialization
 *
 * This module wires the application together: database, chat service,
 * hub task and router.
 *
 * # Initialization Process
 *
 * 1. Open the database and run migrations
 * 2. Wrap the pool in a `SqliteChatStore`
 * 3. Spawn the hub task
 * 4. Create and configure the router
 */

use axum::Router;
use std::sync::Arc;

use crate::backend::chat::{ChatError, SqliteChatStore};
use crate::backend::realtime::Hub;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
///
/// Must be called inside a tokio runtime; the hub task is spawned on it.
///
/// # Errors
///
/// Fails if the database cannot be opened or migrated.
pub async fn create_app(config: ServerConfig) -> Result<Router<()>, ChatError> {
    tracing::info!("Initializing nhcommunity chat backend");

    let pool = load_database(&config.database_url).await?;
    let chat = Arc::new(SqliteChatStore::new(pool));
    let hub = Hub::spawn();
    tracing::info!("Chat hub started");

    let app_state = AppState::new(chat, hub, config);
    Ok(create_router(app_state))
}
