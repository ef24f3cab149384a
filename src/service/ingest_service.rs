//! Indexer ingestion: validates and upserts batches of on-chain events.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::OnchainEvent;
use crate::persistence::Store;

/// Result of one batch element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// New on-chain row written.
    Created {
        /// Stored event id.
        event_id: i64,
        /// Placeholder metadata was created.
        metadata_created: bool,
    },
    /// Existing row for the same transaction refreshed.
    Updated {
        /// Stored event id.
        event_id: i64,
        /// Placeholder metadata was created.
        metadata_created: bool,
    },
    /// Item rejected or failed to persist.
    Failed {
        /// Event id if the item carried one.
        event_id: Option<i64>,
        /// Reason.
        error: String,
    },
}

impl ItemOutcome {
    /// `true` unless the item failed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Outcome of a whole batch, one entry per input item in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Per-item outcomes.
    pub items: Vec<ItemOutcome>,
}

impl IngestReport {
    /// Items persisted.
    #[must_use]
    pub fn persisted(&self) -> usize {
        self.items.iter().filter(|i| i.is_success()).count()
    }

    /// Items that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.items.len() - self.persisted()
    }
}

/// Applies indexer webhooks. Each item is validated and stored on its own
/// so one bad element never blocks the rest of the batch.
#[derive(Debug, Clone)]
pub struct IngestService {
    store: Arc<dyn Store>,
}

fn raw_event_id(value: &Value) -> Option<i64> {
    value
        .get("event_id")
        .or_else(|| value.get("eventId"))
        .and_then(Value::as_i64)
}

impl IngestService {
    /// Creates a new `IngestService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Processes every item, collecting one outcome each.
    pub async fn ingest_batch(&self, items: Vec<Value>) -> IngestReport {
        let mut report = IngestReport {
            items: Vec::with_capacity(items.len()),
        };
        for (index, raw) in items.into_iter().enumerate() {
            let outcome = self.ingest_one(raw).await;
            if let ItemOutcome::Failed { event_id, error } = &outcome {
                tracing::warn!(index, ?event_id, %error, "indexed event rejected");
            }
            report.items.push(outcome);
        }
        tracing::info!(
            received = report.items.len(),
            persisted = report.persisted(),
            failed = report.failed(),
            "indexer batch processed"
        );
        report
    }

    async fn ingest_one(&self, raw: Value) -> ItemOutcome {
        let hint = raw_event_id(&raw);
        let event = match OnchainEvent::from_json(raw) {
            Ok(event) => event,
            Err(e) => {
                return ItemOutcome::Failed {
                    event_id: hint,
                    error: e.to_string(),
                };
            }
        };
        match self.store.ingest_event(&event).await {
            Ok(outcome) if outcome.onchain_inserted => ItemOutcome::Created {
                event_id: outcome.event_id.get(),
                metadata_created: outcome.metadata_created,
            },
            Ok(outcome) => {
                if outcome.event_id != event.event_id {
                    tracing::warn!(
                        reported = %event.event_id,
                        stored = %outcome.event_id,
                        tx = %event.transaction_hash,
                        "transaction already indexed under another event id"
                    );
                }
                ItemOutcome::Updated {
                    event_id: outcome.event_id.get(),
                    metadata_created: outcome.metadata_created,
                }
            }
            Err(e) => {
                if let crate::error::GatewayError::PersistenceError(detail) = &e {
                    tracing::error!(event_id = %event.event_id, error = %detail, "ingest failed");
                }
                ItemOutcome::Failed {
                    event_id: Some(event.event_id.get()),
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{EventId, MetadataPatch};
    use crate::persistence::{EventFilter, EventStore, MemoryStore};

    fn item(id: i64) -> Value {
        json!({
            "eventId": id,
            "vaultAddress": format!("0x{:040x}", 0x1000 + id),
            "organizerAddress": "0x2222222222222222222222222222222222222222",
            "stakeAmount": "5000000",
            "maxParticipants": 20,
            "registrationDeadline": 1_700_000_000,
            "eventDate": 1_700_003_600,
            "transactionHash": format!("0x{id:064x}"),
            "blockNumber": 100 + id,
        })
    }

    fn service() -> (IngestService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (IngestService::new(Arc::clone(&store) as Arc<dyn Store>), store)
    }

    #[tokio::test]
    async fn one_malformed_item_does_not_block_the_batch() {
        let (svc, store) = service();
        let mut items: Vec<Value> = (1..=9).map(item).collect();
        let mut bad = item(10);
        bad["registrationDeadline"] = json!(1_800_000_000);
        items.insert(4, bad);

        let report = svc.ingest_batch(items).await;
        assert_eq!(report.items.len(), 10);
        assert_eq!(report.persisted(), 9);
        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.items.get(4),
            Some(ItemOutcome::Failed { event_id: Some(10), .. })
        ));

        let filter = EventFilter {
            limit: 100,
            ..EventFilter::default()
        };
        let Ok((_, total)) = store.list_events(&filter).await else {
            panic!("list");
        };
        assert_eq!(total, 9);
    }

    #[tokio::test]
    async fn wrong_shape_is_reported() {
        let (svc, _) = service();
        let report = svc.ingest_batch(vec![json!("not an object"), json!({"eventId": 3})]).await;
        assert_eq!(report.failed(), 2);
        assert!(matches!(
            report.items.get(1),
            Some(ItemOutcome::Failed { event_id: Some(3), .. })
        ));
    }

    #[tokio::test]
    async fn reingest_is_idempotent_and_keeps_metadata() {
        let (svc, store) = service();
        let _ = svc.ingest_batch(vec![item(42)]).await;
        let patch = MetadataPatch {
            title: Some("Hackathon".to_string()),
            description: Some("48h".to_string()),
            ..MetadataPatch::default()
        };
        let Ok(()) = store.save_metadata(EventId::new(42), &patch, None).await else {
            panic!("save metadata");
        };

        let report = svc.ingest_batch(vec![item(42)]).await;
        assert_eq!(
            report.items,
            vec![ItemOutcome::Updated {
                event_id: 42,
                metadata_created: false
            }]
        );

        let Ok(Some(record)) = store.find_event(EventId::new(42)).await else {
            panic!("event stored");
        };
        let Some(meta) = record.metadata else {
            panic!("metadata kept");
        };
        assert_eq!(meta.title, "Hackathon");
        assert_eq!(meta.description.as_deref(), Some("48h"));
    }

    #[tokio::test]
    async fn redelivered_hash_reports_the_stored_event() {
        let (svc, store) = service();
        let _ = svc.ingest_batch(vec![item(42)]).await;

        let mut renumbered = item(42);
        renumbered["eventId"] = json!(43);
        let report = svc.ingest_batch(vec![renumbered]).await;
        assert_eq!(
            report.items,
            vec![ItemOutcome::Updated {
                event_id: 42,
                metadata_created: false
            }]
        );
        assert!(matches!(store.find_event(EventId::new(43)).await, Ok(None)));
    }
}
