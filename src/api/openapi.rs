//! OpenAPI document for every REST endpoint.

use axum::Router;
use utoipa::OpenApi;

use super::dto;
use super::handlers::{checkin, event, ingest, profile, registration, system};
use crate::app_state::AppState;
use crate::domain;
use crate::error::{ErrorBody, ErrorResponse};

/// Path of the generated document.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Generated OpenAPI 3.1 document.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "ATFi Gateway",
        description = "Profiles, event metadata, registration, check-in and on-chain reads for the ATFi event-commitment platform."
    ),
    paths(
        system::health_handler,
        system::db_health_handler,
        profile::create_profile,
        profile::get_profile,
        profile::update_profile,
        profile::upsert_profile,
        event::create_event,
        event::list_events,
        event::get_event,
        event::update_event,
        event::update_event_status,
        event::settle_event,
        event::notify_settlement,
        registration::register,
        registration::withdraw,
        registration::get_registration,
        registration::list_participants,
        registration::list_attended,
        registration::claim,
        checkin::submit_checkin,
        checkin::validate_checkin,
        checkin::list_checkins,
        ingest::ingest_events,
    ),
    components(schemas(
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
        domain::EventDetail,
        domain::EventStatus,
        domain::SettlementSummary,
        domain::Profile,
        domain::Participant,
        domain::ParticipantWithProfile,
        domain::Checkin,
        dto::PaginationMeta,
        dto::MessageResponse,
        dto::CreateEventRequest,
        dto::UpdateEventRequest,
        dto::UpdateStatusRequest,
        dto::SettleEventRequest,
        dto::EventListResponse,
        dto::SettlementNoticeResponse,
        dto::ProfileRequest,
        dto::UpdateProfileRequest,
        dto::ProfileWithBalance,
        dto::RegisterRequest,
        dto::ClaimRequest,
        dto::ParticipantResponse,
        dto::ParticipantListResponse,
        dto::AttendedResponse,
        dto::CheckinRequest,
        dto::ValidateCheckinRequest,
        dto::CheckinListResponse,
        dto::IngestRequest,
        dto::IngestItemResult,
        dto::IngestResponse,
    )),
    tags(
        (name = "System", description = "Liveness and dependency checks"),
        (name = "Profiles", description = "Wallet-keyed user profiles"),
        (name = "Events", description = "Event metadata, lifecycle and settlement"),
        (name = "Registration", description = "Participants, withdrawals and claims"),
        (name = "Check-in", description = "QR proofs of presence"),
        (name = "Indexer", description = "On-chain event ingestion"),
    )
)]
pub struct ApiDoc;

/// Serves the document, plus Swagger UI when the `swagger-ui` feature is on.
pub fn routes() -> Router<AppState> {
    #[cfg(feature = "swagger-ui")]
    {
        Router::new().merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url(OPENAPI_JSON_PATH, ApiDoc::openapi()),
        )
    }
    #[cfg(not(feature = "swagger-ui"))]
    {
        Router::new().route(
            OPENAPI_JSON_PATH,
            axum::routing::get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
    }
}
