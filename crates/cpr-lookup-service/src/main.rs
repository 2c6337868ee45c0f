//! CPR Lookup Service - Entry point.

use anyhow::Context;
use cpr_client::FamilyLookup;
use cpr_lookup_service::{
    api::{create_router, AppState, LookupQuota},
    config::{Config, LogConfig},
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config.log);

    info!("Starting CPR Lookup Service");

    // Loads the client certificate; fails fast if it is unreadable
    let client = config.registry.build_client()?;
    info!(endpoint = %client.endpoint(), "CPR registry client ready");

    let lookup = FamilyLookup::new(client, config.invocation_context());
    let state = AppState::new(lookup);

    let quota = config.rate_limit.global_per_minute.map(LookupQuota::per_minute);
    match &quota {
        Some(quota) => info!(per_minute = quota.limit().get(), "Lookup quota enabled"),
        None => info!("Lookup quota disabled"),
    }
    let app = create_router(state, quota);

    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

    let registry = tracing_subscriber::registry().with(filter);

    if log.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
