//! Event DTOs: metadata writes, status changes, settlement and listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{PaginationMeta, non_blank};
use crate::domain::{EventDetail, EventId, EventStatus, MetadataPatch, WalletAddress};
use crate::service::SettlementNotice;

/// Request body for `POST /events`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    /// Identifier of an already indexed on-chain event.
    pub event_id: i64,
    /// Display title.
    pub title: String,
    /// Long-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Cover image URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CreateEventRequest {
    /// Metadata patch carried by the request. Blank fields are dropped.
    #[must_use]
    pub fn patch(&self) -> MetadataPatch {
        MetadataPatch {
            title: non_blank(Some(self.title.clone())),
            description: non_blank(self.description.clone()),
            image_url: non_blank(self.image_url.clone()),
        }
    }
}

/// Request body for `PUT /events/{id}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateEventRequest {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New cover image URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl UpdateEventRequest {
    /// Partial metadata patch; blank fields leave the stored value alone.
    #[must_use]
    pub fn patch(&self) -> MetadataPatch {
        MetadataPatch {
            title: non_blank(self.title.clone()),
            description: non_blank(self.description.clone()),
            image_url: non_blank(self.image_url.clone()),
        }
    }
}

/// Request body for `PUT /events/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// Target status, e.g. `REGISTRATION_CLOSED`.
    pub status: String,
}

/// Request body for `POST /events/{id}/settle`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SettleEventRequest {
    /// Gross yield produced by the vault, decimal string.
    pub total_yield_earned: String,
    /// Yield distributed after fees, decimal string.
    pub total_net_yield: String,
}

/// Query parameters for `GET /events`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListParams {
    /// Stored status filter.
    #[serde(default)]
    pub status: Option<String>,
    /// Organizer wallet filter.
    #[serde(default)]
    pub organizer: Option<String>,
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page (max 100). Defaults to 20. `limit` is accepted as an alias.
    #[serde(default, alias = "limit")]
    pub per_page: Option<u32>,
}

/// Paginated list response for `GET /events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Events on this page, newest first.
    pub data: Vec<EventDetail>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response body for `POST /events/{id}/notify-settlement`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SettlementNoticeResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Event notified about.
    pub event_id: EventId,
    /// Organizer wallet.
    pub organizer_address: WalletAddress,
    /// Effective status at notification time.
    pub status: EventStatus,
    /// Notification time.
    pub notified_at: DateTime<Utc>,
}

impl From<SettlementNotice> for SettlementNoticeResponse {
    fn from(notice: SettlementNotice) -> Self {
        Self {
            message: "organizer notified about settlement".to_string(),
            event_id: notice.event_id,
            organizer_address: notice.organizer_address,
            status: notice.status,
            notified_at: notice.notified_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_not_patched() {
        let req = UpdateEventRequest {
            title: Some("  ".to_string()),
            description: Some("Night run".to_string()),
            image_url: None,
        };
        let patch = req.patch();
        assert_eq!(patch.title, None);
        assert_eq!(patch.description.as_deref(), Some("Night run"));
        assert!(UpdateEventRequest::default().patch().is_empty());
    }

    #[test]
    fn list_params_accept_limit() {
        let params: Result<EventListParams, _> =
            serde_json::from_value(serde_json::json!({"status": "LIVE", "limit": 3}));
        assert!(matches!(params, Ok(ref p) if p.per_page == Some(3) && p.page.is_none()));
    }
}
