use mimalloc::MiMalloc;
use sheets_nexus::config::{CONFIG, Config};
use sheets_nexus::store::{JsonFileStore, TokenStore};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg: &Config = &CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        base_url = %cfg.base_url,
        token_file = %cfg.token_file.display(),
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.loglevel
    );
    if cfg.google_client_id.is_empty() || cfg.google_client_secret.is_empty() {
        warn!("GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET not set; authorization will fail");
    }

    let store = TokenStore::new(JsonFileStore::new(cfg.token_file.clone()));
    info!(users = store.load().len(), "credential store opened");

    // Build axum router and serve
    let state = sheets_nexus::router::NexusState::new(cfg.clone(), store)?;
    let app = sheets_nexus::router::nexus_router(state);

    let listener = TcpListener::bind(cfg.listen_addr.as_str()).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
