//! Mutable off-chain event metadata.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::amount::TokenAmount;
use super::event_id::EventId;
use super::event_status::EventStatus;

/// Figures frozen when an event is settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SettlementSummary {
    /// Gross yield earned by the vault.
    pub total_yield_earned: TokenAmount,
    /// Yield left for attendees after fees.
    pub total_net_yield: TokenAmount,
    /// Registered participants at settlement time.
    pub participants: i64,
    /// Attended participants at settlement time.
    pub attended: i64,
    /// When settlement was recorded.
    pub settled_at: DateTime<Utc>,
}

/// One row of `events_metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EventMetadata {
    /// Foreign key to `events_onchain`.
    pub event_id: EventId,
    /// Display title.
    pub title: String,
    /// Long-form description.
    pub description: Option<String>,
    /// Cover image.
    pub image_url: Option<String>,
    /// Stored lifecycle status.
    pub status: EventStatus,
    /// Organizer profile, when one was known at creation.
    pub organizer_id: Option<Uuid>,
    /// Present once settled.
    pub settlement: Option<SettlementSummary>,
}

impl EventMetadata {
    /// Title used until the organizer supplies one.
    #[must_use]
    pub fn placeholder_title(event_id: EventId) -> String {
        format!("Event #{event_id}")
    }

    /// Synthesized metadata for an event nobody has described yet.
    #[must_use]
    pub fn placeholder(event_id: EventId) -> Self {
        Self {
            event_id,
            title: Self::placeholder_title(event_id),
            description: None,
            image_url: None,
            status: EventStatus::RegistrationOpen,
            organizer_id: None,
            settlement: None,
        }
    }
}

/// Organizer-supplied descriptive fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataPatch {
    /// New title, if changing.
    pub title: Option<String>,
    /// New description, if changing.
    pub description: Option<String>,
    /// New image URL, if changing.
    pub image_url: Option<String>,
}

impl MetadataPatch {
    /// `true` when no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.image_url.is_none()
    }

    /// Applies the patch on top of `current`.
    #[must_use]
    pub fn apply(&self, mut current: EventMetadata) -> EventMetadata {
        if let Some(title) = &self.title {
            current.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            current.description = Some(description.clone());
        }
        if let Some(image_url) = &self.image_url {
            current.image_url = Some(image_url.clone());
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_open_with_title() {
        let meta = EventMetadata::placeholder(EventId::new(42));
        assert_eq!(meta.title, "Event #42");
        assert_eq!(meta.status, EventStatus::RegistrationOpen);
        assert!(meta.settlement.is_none());
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let base = EventMetadata::placeholder(EventId::new(1));
        let patch = MetadataPatch {
            description: Some("bring water".to_string()),
            ..MetadataPatch::default()
        };
        let next = patch.apply(base.clone());
        assert_eq!(next.title, base.title);
        assert_eq!(next.description.as_deref(), Some("bring water"));
        assert!(!patch.is_empty());
        assert!(MetadataPatch::default().is_empty());
    }
}
