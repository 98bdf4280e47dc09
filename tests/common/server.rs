//! Test server helpers
//!
//! `TestApp` builds the full router over an in-memory database. It can be
//! driven in-process with `axum_test::TestServer` or bound to a real
//! loopback port for WebSocket clients.

#[cfg(feature = "ssr")]
use std::net::SocketAddr;
#[cfg(feature = "ssr")]
use std::time::Duration;

#[cfg(feature = "ssr")]
use axum::Router;
#[cfg(feature = "ssr")]
use axum_test::TestServer;
#[cfg(feature = "ssr")]
use nhcommunity::backend::realtime::Hub;
#[cfg(feature = "ssr")]
use nhcommunity::backend::routes::create_router;
#[cfg(feature = "ssr")]
use nhcommunity::backend::server::{AppState, ServerConfig};
#[cfg(feature = "ssr")]
use nhcommunity::shared::UserId;
#[cfg(feature = "ssr")]
use tokio::net::TcpListener;

#[cfg(feature = "ssr")]
use super::{test_config, TestDatabase};

/// A fully wired application over a private database
#[cfg(feature = "ssr")]
pub struct TestApp {
    pub db: TestDatabase,
    pub hub: Hub,
    pub router: Router<()>,
}

#[cfg(feature = "ssr")]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: ServerConfig) -> Self {
        let db = TestDatabase::new().await;
        let hub = Hub::spawn();
        let state = AppState::new(db.service(), hub.clone(), config);
        Self {
            router: create_router(state),
            db,
            hub,
        }
    }

    /// In-process HTTP test server
    pub fn test_server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }

    /// Serve the router on an ephemeral loopback port
    pub async fn spawn(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Test server failed");
        });
        addr
    }

    /// Wait until the hub reports `expected` sessions for `user_id`
    pub async fn wait_for_sessions(&self, user_id: UserId, expected: usize) {
        let hub = self.hub.clone();
        tokio::time::timeout(Duration::from_secs(5), async move {
            while hub.session_count(user_id).await != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("user {} never reached {} sessions", user_id, expected));
    }
}
