//! System endpoints: liveness and database health.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` when the probe passed.
    pub status: String,
    /// Probe time, RFC 3339.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
}

impl HealthResponse {
    fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse::healthy()))
}

/// `GET /health/db`: Storage round-trip.
///
/// # Errors
///
/// Returns [`GatewayError::PersistenceError`] when the database cannot be reached.
#[utoipa::path(
    get,
    path = "/health/db",
    tag = "System",
    summary = "Database health check",
    description = "Runs a trivial query against the store.",
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 500, description = "Database unreachable", body = ErrorResponse),
    )
)]
pub async fn db_health_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    state.store.ping().await?;
    Ok(Json(HealthResponse::healthy()))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/health/db", get(db_health_handler))
}
