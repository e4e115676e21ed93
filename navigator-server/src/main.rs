use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use navigator_server::cache::{CacheConfig, CachedLegSource};
use navigator_server::digitransit::{
    DigitransitClient, DigitransitConfig, LegSource, MockLegSource,
};
use navigator_server::session::{ProgressConfig, SessionConfig, SystemClock};
use navigator_server::web::{AppState, create_router};

/// Default listen address.
const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// How often finished sessions are swept from the registry.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,navigator_server=debug")),
        )
        .init();

    let addr: SocketAddr = std::env::var("NAVIGATOR_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;

    let cache_config = CacheConfig::default();

    // Serve canned legs instead of calling the API
    if let Ok(dir) = std::env::var("NAVIGATOR_MOCK_DATA") {
        info!(%dir, "using mock leg data");
        let source = MockLegSource::from_dir(&dir)?;
        return serve(CachedLegSource::new(source, &cache_config), addr).await;
    }

    let api_key = std::env::var("DIGITRANSIT_API_KEY")
        .map_err(|_| "DIGITRANSIT_API_KEY not set (or set NAVIGATOR_MOCK_DATA)")?;

    let mut config = DigitransitConfig::new(api_key);
    if let Ok(url) = std::env::var("DIGITRANSIT_BASE_URL") {
        config = config.with_base_url(url);
    }
    if let Ok(router) = std::env::var("DIGITRANSIT_ROUTER") {
        config = config.with_router(router);
    }
    info!(endpoint = %config.endpoint(), "using Digitransit");

    let client = DigitransitClient::new(config)?;
    serve(CachedLegSource::new(client, &cache_config), addr).await
}

async fn serve<S: LegSource>(
    source: S,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(
        source,
        Arc::new(SystemClock),
        SessionConfig::default(),
        ProgressConfig::default(),
    );

    // Sweep finished sessions nobody is asking about any more
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            let evicted = sweep_state.evict_finished().await;
            if evicted > 0 {
                debug!(evicted, "swept finished sessions");
            }
        }
    });

    let app = create_router(state);

    info!(%addr, "trip navigator listening");
    info!("  GET    /health        - Health check");
    info!("  POST   /sessions      - Start tracking an itinerary");
    info!("  GET    /sessions/:id  - Current snapshot (?lat=&lon= for progress)");
    info!("  DELETE /sessions/:id  - Stop tracking");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
