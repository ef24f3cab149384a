//! Indexer webhook DTOs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::service::{IngestReport, ItemOutcome};

/// Body of `POST /indexer/events`: either `{"events": [...]}` or a bare array.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum IngestRequest {
    /// Wrapped batch.
    Wrapped {
        /// Raw indexer events.
        events: Vec<Value>,
    },
    /// Bare array of events.
    Bare(Vec<Value>),
}

impl IngestRequest {
    /// The raw items, whatever the envelope.
    #[must_use]
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Self::Wrapped { events } | Self::Bare(events) => events,
        }
    }
}

/// Outcome of a single batch item.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestItemResult {
    /// Position in the submitted batch.
    pub index: usize,
    /// Event id, when the item carried a readable one.
    pub event_id: Option<i64>,
    /// `created`, `updated` or `failed`.
    pub outcome: &'static str,
    /// Whether a placeholder metadata row was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_created: Option<bool>,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated batch report.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    /// Items received.
    pub received: usize,
    /// Items persisted.
    pub persisted: usize,
    /// Items rejected.
    pub failed: usize,
    /// One entry per item, in input order.
    pub results: Vec<IngestItemResult>,
}

impl From<IngestReport> for IngestResponse {
    fn from(report: IngestReport) -> Self {
        let received = report.items.len();
        let persisted = report.persisted();
        let failed = report.failed();
        let results = report
            .items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                ItemOutcome::Created {
                    event_id,
                    metadata_created,
                } => IngestItemResult {
                    index,
                    event_id: Some(event_id),
                    outcome: "created",
                    metadata_created: Some(metadata_created),
                    error: None,
                },
                ItemOutcome::Updated {
                    event_id,
                    metadata_created,
                } => IngestItemResult {
                    index,
                    event_id: Some(event_id),
                    outcome: "updated",
                    metadata_created: Some(metadata_created),
                    error: None,
                },
                ItemOutcome::Failed { event_id, error } => IngestItemResult {
                    index,
                    event_id,
                    outcome: "failed",
                    metadata_created: None,
                    error: Some(error),
                },
            })
            .collect();
        Self {
            received,
            persisted,
            failed,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn both_envelopes_are_accepted() {
        let wrapped: Result<IngestRequest, _> =
            serde_json::from_value(json!({"events": [{"eventId": 1}]}));
        let bare: Result<IngestRequest, _> = serde_json::from_value(json!([{}, {}]));
        assert!(matches!(wrapped.map(IngestRequest::into_items), Ok(ref v) if v.len() == 1));
        assert!(matches!(bare.map(IngestRequest::into_items), Ok(ref v) if v.len() == 2));
    }

    #[test]
    fn report_is_summarized() {
        let report = IngestReport {
            items: vec![
                ItemOutcome::Created {
                    event_id: 1,
                    metadata_created: true,
                },
                ItemOutcome::Failed {
                    event_id: None,
                    error: "malformed payload".to_string(),
                },
            ],
        };
        let response = IngestResponse::from(report);
        assert_eq!((response.received, response.persisted, response.failed), (2, 1, 1));
        let json = serde_json::to_value(&response).unwrap_or_default();
        assert_eq!(json["results"][1]["outcome"], json!("failed"));
        assert!(json["results"][0].get("error").is_none());
    }
}
