use std::net::SocketAddr;

use anyhow::Context;
use imagedash::config::AppConfig;
use imagedash::store::StoreClient;
use imagedash::AppState;
use mimalloc::MiMalloc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// M-MIMALLOC-APP: Use mimalloc as global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imagedash=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let host: std::net::IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid BACKEND_HOST '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);

    let state = AppState {
        store: StoreClient::from_config(&config),
        config,
    };

    tracing::info!(
        host = %addr,
        store = %state.config.store_url,
        site = %state.config.site.site_name,
        "Starting image dashboard API server"
    );

    let app = imagedash::routes::router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
