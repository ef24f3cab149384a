//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::chain::ChainError;
use crate::domain::EventId;
use crate::domain::event_status::UnknownStatus;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "event not found: 42",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                    |
/// |-----------|-------------------|--------------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request                |
/// | 2000–2999 | Not Found / State | 404 / 403 / 409                |
/// | 3000–3999 | Server            | 500 Internal Server Error      |
/// | 5000–5999 | Upstream chain    | 502 Bad Gateway                |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No on-chain row for this event.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// No profile for this wallet.
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// Wallet is not registered for the event.
    #[error("participant {wallet} not registered for event {event_id}")]
    ParticipantNotFound {
        /// Event looked up.
        event_id: EventId,
        /// Wallet looked up.
        wallet: String,
    },

    /// No check-in with this id.
    #[error("check-in not found: {0}")]
    CheckinNotFound(uuid::Uuid),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Status string did not name a known status.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Caller may not perform this action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Request conflicts with the current state.
    #[error("{0}")]
    Conflict(String),

    /// Persistence layer failure. The detail is logged, never returned.
    #[error("database error")]
    PersistenceError(String),

    /// Contract read failed on a path that cannot degrade.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidStatus(_) => 1002,
            Self::EventNotFound(_) => 2001,
            Self::ProfileNotFound(_) => 2002,
            Self::ParticipantNotFound { .. } => 2003,
            Self::CheckinNotFound(_) => 2004,
            Self::Conflict(_) => 2009,
            Self::Forbidden(_) => 2010,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::Chain(_) => 5001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            Self::EventNotFound(_)
            | Self::ProfileNotFound(_)
            | Self::ParticipantNotFound { .. }
            | Self::CheckinNotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Chain(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Shorthand for [`GatewayError::Conflict`].
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(e: sqlx::Error) -> Self {
        Self::PersistenceError(e.to_string())
    }
}

impl From<UnknownStatus> for GatewayError {
    fn from(e: UnknownStatus) -> Self {
        Self::InvalidStatus(e.0)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::PersistenceError(detail) => {
                tracing::error!(error = %detail, "persistence failure");
            }
            Self::Internal(detail) => tracing::error!(error = %detail, "internal failure"),
            Self::Chain(e) => tracing::warn!(error = %e, "chain read failed"),
            _ => {}
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_detail_is_hidden() {
        let err = GatewayError::PersistenceError("relation \"x\" does not exist".to_string());
        assert_eq!(err.to_string(), "database error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn status_codes_by_kind() {
        assert_eq!(
            GatewayError::EventNotFound(EventId::new(1)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::conflict("already registered").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GatewayError::Forbidden("not organizer".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GatewayError::InvalidStatus("DONE".into()).error_code(),
            1002
        );
    }
}
