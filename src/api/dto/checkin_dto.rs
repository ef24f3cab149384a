//! Check-in DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Checkin;

/// Request body for `POST /checkin`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckinRequest {
    /// Event checked into.
    pub event_id: i64,
    /// Attendee wallet.
    pub user_address: String,
    /// Scanned QR payload; generated when omitted.
    #[serde(default)]
    pub qr_data: Option<String>,
}

/// Request body for `POST /checkin/validate`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateCheckinRequest {
    /// Check-in to review.
    pub checkin_id: uuid::Uuid,
    /// Accept (`true`) or reject the check-in.
    pub is_valid: bool,
    /// Organizer wallet performing the review.
    pub validated_by: String,
}

/// `GET /events/{id}/checkins` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckinListResponse {
    /// Check-ins, newest first.
    pub checkins: Vec<Checkin>,
    /// Number of check-ins.
    pub count: usize,
}
