/**
 * nhcommunity Chat Server Entry Point
 *
 * Loads `.env`, installs tracing, builds the app and serves it.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = nhcommunity::backend::server::ServerConfig::from_env()?;
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));

    let app = nhcommunity::backend::server::init::create_app(config).await?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin nhcommunity-server --features ssr");
    std::process::exit(1);
}
