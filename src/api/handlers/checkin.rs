//! Check-in handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{CheckinListResponse, CheckinRequest, ValidateCheckinRequest, parse_wallet};
use crate::app_state::AppState;
use crate::domain::{Checkin, EventId};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /checkin`: Record a check-in.
///
/// # Errors
///
/// Returns [`GatewayError::Conflict`] if the wallet already checked in.
#[utoipa::path(
    post,
    path = "/api/v1/checkin",
    tag = "Check-in",
    summary = "Check in to event",
    description = "Stores a QR proof of presence. QR data is generated when the request omits it.",
    request_body = CheckinRequest,
    responses(
        (status = 201, description = "Check-in recorded", body = Checkin),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Already checked in", body = ErrorResponse),
    )
)]
pub async fn submit_checkin(
    State(state): State<AppState>,
    Json(req): Json<CheckinRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = parse_wallet("user_address", &req.user_address)?;
    let checkin = state
        .checkin_service
        .submit(EventId::new(req.event_id), &wallet, req.qr_data)
        .await?;
    Ok((StatusCode::CREATED, Json(checkin)))
}

/// `POST /checkin/validate`: Organizer review of a check-in.
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] when `validated_by` is not the
/// organizer and [`GatewayError::Conflict`] if already validated.
#[utoipa::path(
    post,
    path = "/api/v1/checkin/validate",
    tag = "Check-in",
    summary = "Validate check-in",
    description = "Accepting a check-in also marks the participant attended. That second write is best-effort and never fails the request.",
    request_body = ValidateCheckinRequest,
    responses(
        (status = 200, description = "Reviewed check-in", body = Checkin),
        (status = 403, description = "Not the organizer", body = ErrorResponse),
        (status = 404, description = "Check-in not found", body = ErrorResponse),
        (status = 409, description = "Already validated", body = ErrorResponse),
    )
)]
pub async fn validate_checkin(
    State(state): State<AppState>,
    Json(req): Json<ValidateCheckinRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let validator = parse_wallet("validated_by", &req.validated_by)?;
    let checkin = state
        .checkin_service
        .validate(req.checkin_id, req.is_valid, &validator)
        .await?;
    Ok(Json(checkin))
}

/// `GET /events/{id}/checkins`: Check-ins for an event.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] for unknown events.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/checkins",
    tag = "Check-in",
    summary = "List check-ins",
    params(
        ("id" = i64, Path, description = "On-chain event id"),
    ),
    responses(
        (status = 200, description = "Check-ins, newest first", body = CheckinListResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn list_checkins(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, GatewayError> {
    let checkins = state.checkin_service.list(EventId::new(id)).await?;
    Ok(Json(CheckinListResponse {
        count: checkins.len(),
        checkins,
    }))
}

/// Check-in routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/checkin", post(submit_checkin))
        .route("/checkin/validate", post(validate_checkin))
        .route("/events/{id}/checkins", get(list_checkins))
}
