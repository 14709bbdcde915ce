//! HTTP listener lifecycle.

use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::routes;
use crate::signals::ShutdownSignal;
use crate::state::AppState;

/// Binds the listener and serves until `shutdown` completes.
///
/// # Errors
///
/// Returns a configuration error if the feed client cannot be built and an
/// IO error if the address cannot be bound.
pub async fn serve(config: ServerConfig, shutdown: ShutdownSignal) -> ServerResult<()> {
    let state = AppState::from_config(&config)?;
    let listener = TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!(
        addr = %addr,
        feed_host = %config.feed.host(),
        ttl_secs = config.cache_ttl.as_secs(),
        fetch_timeout_secs = config.fetch_timeout.as_secs(),
        "availcal-server listening"
    );

    axum::serve(listener, routes::app(state))
        .with_graceful_shutdown(shutdown.wait())
        .await?;

    info!("availcal-server stopped");
    Ok(())
}
