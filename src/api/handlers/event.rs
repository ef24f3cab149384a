//! Event handlers: metadata, listing, status lifecycle and settlement.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    CreateEventRequest, EventListParams, EventListResponse, PaginationMeta, PaginationParams,
    SettleEventRequest, SettlementNoticeResponse, UpdateEventRequest, UpdateStatusRequest,
    non_blank, parse_amount, parse_wallet,
};
use crate::app_state::AppState;
use crate::domain::{EventDetail, EventId, EventStatus};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::EventQuery;

/// `POST /events`: Attach metadata to an indexed event.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] if the indexer has not seen the
/// event, [`GatewayError::InvalidRequest`] for a blank title.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Create event metadata",
    description = "Stores title, description and image for an event already written by the indexer. An existing status is kept.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Metadata stored", body = EventDetail),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Event not indexed", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let patch = req.patch();
    if patch.title.is_none() {
        return Err(GatewayError::InvalidRequest("title is required".to_string()));
    }
    let detail = state
        .event_service
        .create_metadata(EventId::new(req.event_id), &patch)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// `GET /events`: Paginated event listing.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidStatus`] or [`GatewayError::InvalidRequest`]
/// for unparseable filters.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "List events",
    description = "Returns indexed events newest first, optionally filtered by stored status and organizer. Events without metadata appear with placeholder values.",
    params(EventListParams),
    responses(
        (status = 200, description = "Paginated event list", body = EventListResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<EventListParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let paging = PaginationParams {
        page: params.page.unwrap_or(1),
        per_page: params.per_page.unwrap_or(PaginationParams::default().per_page),
    }
    .clamped();
    let status = non_blank(params.status)
        .map(|s| s.parse::<EventStatus>())
        .transpose()?;
    let organizer = non_blank(params.organizer)
        .map(|o| parse_wallet("organizer", &o))
        .transpose()?;

    let query = EventQuery {
        status,
        organizer,
        page: paging.page,
        per_page: paging.per_page,
    };
    let (data, total) = state.event_service.list_events(&query).await?;

    Ok(Json(EventListResponse {
        data,
        pagination: PaginationMeta::new(paging.page, paging.per_page, total),
    }))
}

/// `GET /events/{id}`: Complete event view.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] if the event was never indexed.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Get event details",
    description = "Joins on-chain facts with metadata, derives the current status and adds the vault's participant count when the chain is reachable.",
    params(
        ("id" = i64, Path, description = "On-chain event id"),
    ),
    responses(
        (status = 200, description = "Event details", body = EventDetail),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, GatewayError> {
    let detail = state.event_service.get_event(EventId::new(id)).await?;
    Ok(Json(detail))
}

/// `PUT /events/{id}`: Partial metadata update.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] when no field is set.
#[utoipa::path(
    put,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Update event metadata",
    description = "Updates any of title, description and image URL.",
    params(
        ("id" = i64, Path, description = "On-chain event id"),
    ),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = EventDetail),
        (status = 400, description = "Empty update", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let detail = state
        .event_service
        .update_metadata(EventId::new(id), &req.patch())
        .await?;
    Ok(Json(detail))
}

/// `PUT /events/{id}/status`: Administrative status change.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidStatus`] for unknown statuses and
/// [`GatewayError::Conflict`] for illegal transitions.
#[utoipa::path(
    put,
    path = "/api/v1/events/{id}/status",
    tag = "Events",
    summary = "Update event status",
    description = "Moves an event along the lifecycle. Terminal statuses cannot be left and SETTLED is only reachable through settlement.",
    params(
        ("id" = i64, Path, description = "On-chain event id"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated event", body = EventDetail),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse),
    )
)]
pub async fn update_event_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let next: EventStatus = req.status.parse()?;
    let detail = state
        .event_service
        .update_status(EventId::new(id), next)
        .await?;
    Ok(Json(detail))
}

/// `POST /events/{id}/settle`: Record yields and settle a live event.
///
/// # Errors
///
/// Returns [`GatewayError::Conflict`] unless the event is `LIVE`.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/settle",
    tag = "Events",
    summary = "Settle event",
    description = "Stores the yield totals, freezes participant counters and marks a LIVE event SETTLED.",
    params(
        ("id" = i64, Path, description = "On-chain event id"),
    ),
    request_body = SettleEventRequest,
    responses(
        (status = 200, description = "Settled event", body = EventDetail),
        (status = 400, description = "Invalid amounts", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Event is not live", body = ErrorResponse),
    )
)]
pub async fn settle_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SettleEventRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let earned = parse_amount("total_yield_earned", &req.total_yield_earned)?;
    let net = parse_amount("total_net_yield", &req.total_net_yield)?;
    let detail = state
        .event_service
        .settle(EventId::new(id), &earned, &net)
        .await?;
    Ok(Json(detail))
}

/// `POST /events/{id}/notify-settlement`: Notify the organizer.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] for unknown events.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/notify-settlement",
    tag = "Events",
    summary = "Notify organizer about settlement",
    params(
        ("id" = i64, Path, description = "On-chain event id"),
    ),
    responses(
        (status = 200, description = "Organizer notified", body = SettlementNoticeResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn notify_settlement(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, GatewayError> {
    let notice = state
        .event_service
        .notify_settlement(EventId::new(id))
        .await?;
    Ok(Json(SettlementNoticeResponse::from(notice)))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event).get(list_events))
        .route("/events/{id}", get(get_event).put(update_event))
        .route("/events/{id}/status", put(update_event_status))
        .route("/events/{id}/settle", post(settle_event))
        .route("/events/{id}/notify-settlement", post(notify_settlement))
}
