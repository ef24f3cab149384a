//! Indexer webhook handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{IngestRequest, IngestResponse};
use crate::app_state::AppState;
use crate::error::GatewayError;

/// `POST /indexer/events`: Upsert a batch of on-chain events.
///
/// Items are processed independently; the response carries one result per
/// item and is `200` even when some of them failed.
///
/// # Errors
///
/// Never fails once the body has been parsed; the `Result` keeps the
/// handler signature uniform.
#[utoipa::path(
    post,
    path = "/api/v1/indexer/events",
    tag = "Indexer",
    summary = "Ingest indexed events",
    description = "Accepts `{\"events\": [...]}` or a bare array. Re-delivering an event with the same transaction hash is idempotent and keeps existing metadata.",
    request_body = IngestRequest,
    responses(
        (status = 200, description = "Per-item report", body = IngestResponse),
    )
)]
pub async fn ingest_events(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let report = state.ingest_service.ingest_batch(req.into_items()).await;
    Ok(Json(IngestResponse::from(report)))
}

/// Indexer routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/indexer/events", post(ingest_events))
}
