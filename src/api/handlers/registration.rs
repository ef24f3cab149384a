//! Registration handlers: register, withdraw, participant queries, claims.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AttendedResponse, ClaimRequest, MessageResponse, ParticipantListResponse, ParticipantResponse,
    RegisterRequest, UserQuery, parse_amount, parse_tx_hash, parse_wallet,
};
use crate::app_state::AppState;
use crate::domain::{EventId, Participant};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::RegisterInput;

/// `POST /events/{id}/register`: Register a wallet for an event.
///
/// # Errors
///
/// Returns [`GatewayError::Conflict`] when registration is closed, the event
/// is full or the wallet is already registered.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/register",
    tag = "Registration",
    summary = "Register for event",
    description = "Records a participant after their on-chain deposit. A profile is created for unknown wallets.",
    params(
        ("id" = i64, Path, description = "On-chain event id"),
    ),
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = ParticipantResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Closed, full or duplicate", body = ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let input = RegisterInput {
        wallet: parse_wallet("user_address", &req.user_address)?,
        transaction_hash: parse_tx_hash("transaction_hash", &req.transaction_hash)?,
        deposit_amount: parse_amount("deposit_amount", &req.deposit_amount)?,
    };
    let participant = state
        .registration_service
        .register(EventId::new(id), &input)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ParticipantResponse {
            message: "registered for event".to_string(),
            participant,
        }),
    ))
}

/// `DELETE /events/{id}/register?user=`: Withdraw a registration.
///
/// # Errors
///
/// Returns [`GatewayError::Conflict`] once registration has closed or the
/// participant attended.
#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}/register",
    tag = "Registration",
    summary = "Withdraw registration",
    params(
        ("id" = i64, Path, description = "On-chain event id"),
        UserQuery,
    ),
    responses(
        (status = 200, description = "Registration withdrawn", body = MessageResponse),
        (status = 404, description = "Not registered", body = ErrorResponse),
        (status = 409, description = "Withdrawal no longer possible", body = ErrorResponse),
    )
)]
pub async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = query.wallet()?;
    state
        .registration_service
        .withdraw(EventId::new(id), &wallet)
        .await?;
    Ok(Json(MessageResponse::new("registration withdrawn")))
}

/// `GET /events/{id}/registration?user=`: One registration.
///
/// # Errors
///
/// Returns [`GatewayError::ParticipantNotFound`] if the wallet is not registered.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/registration",
    tag = "Registration",
    summary = "Get registration",
    params(
        ("id" = i64, Path, description = "On-chain event id"),
        UserQuery,
    ),
    responses(
        (status = 200, description = "Participant record", body = Participant),
        (status = 404, description = "Not registered", body = ErrorResponse),
    )
)]
pub async fn get_registration(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = query.wallet()?;
    let participant = state
        .registration_service
        .registration(EventId::new(id), &wallet)
        .await?;
    Ok(Json(participant))
}

/// `GET /events/{id}/participants`: Participants with profile details.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] for unknown events.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/participants",
    tag = "Registration",
    summary = "List participants",
    params(
        ("id" = i64, Path, description = "On-chain event id"),
    ),
    responses(
        (status = 200, description = "Participants", body = ParticipantListResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn list_participants(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, GatewayError> {
    let participants = state
        .registration_service
        .participants(EventId::new(id))
        .await?;
    Ok(Json(ParticipantListResponse {
        count: participants.len(),
        participants,
    }))
}

/// `GET /events/{id}/attended`: Wallets marked attended.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] for unknown events.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/attended",
    tag = "Registration",
    summary = "List attended wallets",
    params(
        ("id" = i64, Path, description = "On-chain event id"),
    ),
    responses(
        (status = 200, description = "Attended wallets", body = AttendedResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn list_attended(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, GatewayError> {
    let attended = state.registration_service.attended(EventId::new(id)).await?;
    Ok(Json(AttendedResponse {
        count: attended.len(),
        attended,
    }))
}

/// `POST /events/{id}/claim`: Claim the attendance reward.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if the participant did not attend
/// and [`GatewayError::Conflict`] if the reward was already claimed.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/claim",
    tag = "Registration",
    summary = "Claim reward",
    params(
        ("id" = i64, Path, description = "On-chain event id"),
    ),
    request_body = ClaimRequest,
    responses(
        (status = 200, description = "Reward claimed", body = ParticipantResponse),
        (status = 400, description = "Participant did not attend", body = ErrorResponse),
        (status = 404, description = "Not registered", body = ErrorResponse),
        (status = 409, description = "Already claimed", body = ErrorResponse),
    )
)]
pub async fn claim(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ClaimRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = parse_wallet("user_address", &req.user_address)?;
    let participant = state
        .registration_service
        .claim(EventId::new(id), &wallet)
        .await?;
    Ok(Json(ParticipantResponse {
        message: "reward claimed".to_string(),
        participant,
    }))
}

/// Registration routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{id}/register", post(register).delete(withdraw))
        .route("/events/{id}/registration", get(get_registration))
        .route("/events/{id}/participants", get(list_participants))
        .route("/events/{id}/attended", get(list_attended))
        .route("/events/{id}/claim", post(claim))
}
