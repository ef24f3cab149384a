//! atfi-gateway server entry point.
//!
//! Loads configuration, connects storage and the chain client, then serves
//! the REST API until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::http::{HeaderValue, StatusCode};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use atfi_gateway::api;
use atfi_gateway::app_state::AppState;
use atfi_gateway::chain::{ChainReader, JsonRpcChainClient};
use atfi_gateway::config::{GatewayConfig, LogFormat};
use atfi_gateway::persistence::{MemoryStore, PostgresStore, Store};
use atfi_gateway::service::StatusSweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting atfi-gateway");

    // Storage
    let postgres = if config.persistence_enabled {
        let store = PostgresStore::connect(&config)
            .await
            .context("failed to connect to PostgreSQL")?;
        tracing::info!("connected to PostgreSQL");
        Some(Arc::new(store))
    } else {
        tracing::warn!("persistence disabled; using in-memory store");
        None
    };
    let store: Arc<dyn Store> = match &postgres {
        Some(pg) => Arc::clone(pg) as Arc<dyn Store>,
        None => Arc::new(MemoryStore::new()),
    };

    // Chain reads
    let chain: Arc<dyn ChainReader> = Arc::new(
        JsonRpcChainClient::new(
            config.rpc_url.clone(),
            config.token_contract_address.clone(),
            config.token_decimals,
            Duration::from_secs(config.rpc_timeout_secs),
        )
        .context("failed to build RPC client")?,
    );
    tracing::info!(
        rpc_url = %config.rpc_url,
        token = %config.token_contract_address,
        "chain client ready"
    );

    // Background status sweep
    let sweeper = StatusSweeper::new(
        Arc::clone(&store),
        Duration::from_secs(config.status_sweep_interval_secs),
    )
    .spawn();

    // Build router
    let app_state = AppState::new(store, chain);
    let app = Router::new()
        .merge(api::build_router())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_allowed_origins))
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    if let Some(pg) = postgres {
        pg.pool().close().await;
    }
    tracing::info!("shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
