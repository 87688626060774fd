use mimalloc::MiMalloc;
use openpack_gateway::{AppState, Config, app_router, db::Storage};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::from_env()?;

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
        database_url = %cfg.database_url,
        loglevel = %cfg.loglevel,
        openpack_username = %cfg.openpack_username,
        openpack_site_id = %cfg
            .openpack_site_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "<first linked>".to_string()),
        vendor_timeout_secs = cfg.vendor_timeout_secs,
    );

    let storage = Storage::connect(&cfg.database_url).await?;
    let addr = cfg.listen_addr.clone();
    let state = AppState::new(cfg, storage)?;
    let app = app_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}
