use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tandem_server::{
    AppState, CacheFacade, CatalogStore, DistributedCache, LocalCache, ServerConfig, create_router,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tandem-server", version, about = "Two-tier response cache service")]
struct Args {
    /// Path to the YAML configuration file (defaults to ./config.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ServerConfig::load(args.config.as_deref())?;

    info!("Starting Tandem Server v{}", env!("CARGO_PKG_VERSION"));

    tandem_server::metrics::init_metrics();

    // Cache tiers: in-process local tier plus the optional shared Redis
    // tier. A failed Redis connection degrades to local-only caching.
    let local = LocalCache::new(config.cache.local.clone());
    let distributed = DistributedCache::new(config.cache.redis.clone());
    distributed.connect().await;

    let facade = Arc::new(CacheFacade::new(
        local,
        distributed,
        config.cache.policy.clone(),
    ));

    // Start background sweep for expired local entries
    facade.local().start_sweeper();

    let environment =
        std::env::var("TANDEM_ENV").unwrap_or_else(|_| "development".to_string());
    let state = AppState::new(
        facade.clone(),
        CatalogStore::new(),
        config.routes.clone(),
        environment,
    );

    // Create router
    let app = create_router(state);

    // Bind server
    let addr: SocketAddr = config.server_addr().parse()?;
    info!("Listening on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The local tier dies with the process; empty it deliberately so the
    // shutdown path matches the administrative clear
    facade.local().flush_all();
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install shutdown signal handler: {}", e);
    }
    info!("Shutdown signal received");
}
