//! Periodic status sweep.
//!
//! Reads already advance statuses lazily; the sweeper persists the same
//! transitions for events nobody has looked at, so listings filtered by
//! stored status stay accurate.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::domain::EventDetail;
use crate::error::GatewayError;
use crate::persistence::Store;

/// Background task advancing stored statuses along the timeline.
#[derive(Debug, Clone)]
pub struct StatusSweeper {
    store: Arc<dyn Store>,
    interval: Duration,
}

impl StatusSweeper {
    /// Creates a sweeper; a zero interval disables [`StatusSweeper::spawn`].
    #[must_use]
    pub fn new(store: Arc<dyn Store>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Runs one pass as of `now` and returns how many events advanced.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the active events cannot be listed.
    /// Individual write failures are logged and skipped.
    pub async fn sweep_once(&self, now: i64) -> Result<usize, GatewayError> {
        let mut advanced = 0;
        for record in self.store.list_active_events().await? {
            let detail = EventDetail::reconcile(record, now);
            if !detail.needs_status_write_back() {
                continue;
            }
            let event_id = detail.event_id;
            match self
                .store
                .compare_and_set_status(event_id, detail.stored_status, detail.status)
                .await
            {
                Ok(true) => {
                    tracing::info!(
                        %event_id,
                        from = %detail.stored_status,
                        to = %detail.status,
                        "event status advanced by sweep"
                    );
                    advanced += 1;
                }
                Ok(false) => {}
                Err(e) => tracing::warn!(%event_id, error = %e, "status sweep write failed"),
            }
        }
        Ok(advanced)
    }

    /// Starts the sweep loop. Returns `None` when the interval is zero.
    #[must_use]
    pub fn spawn(self) -> Option<JoinHandle<()>> {
        if self.interval.is_zero() {
            tracing::info!("status sweeper disabled");
            return None;
        }
        tracing::info!(interval_secs = self.interval.as_secs(), "status sweeper started");
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.sweep_once(Utc::now().timestamp()).await {
                    Ok(0) => {}
                    Ok(advanced) => tracing::debug!(advanced, "status sweep complete"),
                    Err(e) => tracing::warn!(error = %e, "status sweep failed"),
                }
            }
        }))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::event_view::fixtures::onchain;
    use crate::domain::{
        EventId, EventStatus, NewRegistration, ProfilePatch, TokenAmount, TxHash, WalletAddress,
    };
    use crate::persistence::{EventStore, MemoryStore, ParticipantStore, ProfileStore};

    async fn stored_status(store: &MemoryStore, id: i64) -> EventStatus {
        let Ok(Some(record)) = store.find_event(EventId::new(id)).await else {
            panic!("event {id} stored");
        };
        let Some(meta) = record.metadata else {
            panic!("metadata for {id}");
        };
        meta.status
    }

    async fn register_one(store: &MemoryStore, id: i64) {
        let (Ok(wallet), Ok(tx), Ok(amount)) = (
            WalletAddress::parse("0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"),
            TxHash::parse(&format!("0x{}", "ab".repeat(32))),
            TokenAmount::parse_integer("5000000"),
        ) else {
            panic!("valid registration fields");
        };
        let Ok(profile) = store.upsert_profile(&wallet, &ProfilePatch::default()).await else {
            panic!("profile");
        };
        let reg = NewRegistration {
            event_id: EventId::new(id),
            user_id: profile.id,
            deposit_tx_hash: tx,
            deposit_amount: amount,
        };
        let Ok(_) = store.register_participant(&reg, 10).await else {
            panic!("register");
        };
    }

    #[tokio::test]
    async fn sweep_follows_the_timeline() {
        let store = Arc::new(MemoryStore::new());
        for id in 1..=2 {
            let _ = store.ingest_event(&onchain(id, 1_000, 2_000)).await;
        }
        register_one(&store, 1).await;
        let sweeper = StatusSweeper::new(
            Arc::clone(&store) as Arc<dyn Store>,
            Duration::from_secs(60),
        );

        assert!(matches!(sweeper.sweep_once(500).await, Ok(0)));

        let Ok(advanced) = sweeper.sweep_once(1_500).await else {
            panic!("sweep");
        };
        assert_eq!(advanced, 2);
        assert_eq!(stored_status(&store, 1).await, EventStatus::RegistrationClosed);
        assert_eq!(stored_status(&store, 2).await, EventStatus::Voided);

        let Ok(advanced) = sweeper.sweep_once(2_500).await else {
            panic!("sweep");
        };
        assert_eq!(advanced, 1);
        assert_eq!(stored_status(&store, 1).await, EventStatus::Live);
        assert_eq!(stored_status(&store, 2).await, EventStatus::Voided);

        assert!(matches!(sweeper.sweep_once(2_600).await, Ok(0)));
    }

    #[tokio::test]
    async fn zero_interval_does_not_spawn() {
        let sweeper = StatusSweeper::new(Arc::new(MemoryStore::new()), Duration::ZERO);
        assert!(sweeper.spawn().is_none());
    }
}
