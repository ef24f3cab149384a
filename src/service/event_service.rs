//! Event service: reconciles on-chain facts with metadata and drives the
//! status lifecycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::chain::ChainReader;
use crate::domain::{
    EventDetail, EventId, EventStatus, MetadataPatch, TokenAmount, WalletAddress,
};
use crate::error::GatewayError;
use crate::persistence::{EventFilter, Store};

/// Listing request after pagination has been resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Stored status filter.
    pub status: Option<EventStatus>,
    /// Organizer filter.
    pub organizer: Option<WalletAddress>,
    /// 1-indexed page.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
}

/// Acknowledgement of a settlement notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementNotice {
    /// Event notified about.
    pub event_id: EventId,
    /// Organizer who would receive the notice.
    pub organizer_address: WalletAddress,
    /// Effective status when notified.
    pub status: EventStatus,
    /// Notification time.
    pub notified_at: DateTime<Utc>,
}

/// Orchestrates reads and lifecycle changes of events.
///
/// Every read goes through [`EventDetail::reconcile`]; when the clock has
/// moved an event forward, the new status is written back with a
/// compare-and-set so concurrent writers never regress it.
#[derive(Debug, Clone)]
pub struct EventService {
    store: Arc<dyn Store>,
    chain: Arc<dyn ChainReader>,
}

fn unix_now() -> i64 {
    Utc::now().timestamp()
}

impl EventService {
    /// Creates a new `EventService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, chain: Arc<dyn ChainReader>) -> Self {
        Self { store, chain }
    }

    /// Complete event including the vault's own participant count.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] if no on-chain row exists.
    pub async fn get_event(&self, event_id: EventId) -> Result<EventDetail, GatewayError> {
        let mut detail = self.current_state_at(event_id, unix_now()).await?;
        detail.onchain_participant_count = match self
            .chain
            .participant_count(&detail.vault_address)
            .await
        {
            Ok(count) => Some(count.to_string()),
            Err(e) => {
                tracing::warn!(%event_id, error = %e, "on-chain participant count unavailable");
                None
            }
        };
        Ok(detail)
    }

    /// Reconciled event without touching the chain.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] if no on-chain row exists.
    pub async fn current_state(&self, event_id: EventId) -> Result<EventDetail, GatewayError> {
        self.current_state_at(event_id, unix_now()).await
    }

    /// Reconciled event as of `now` (Unix seconds).
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] if no on-chain row exists.
    pub async fn current_state_at(
        &self,
        event_id: EventId,
        now: i64,
    ) -> Result<EventDetail, GatewayError> {
        let mut detail = self.reconciled_at(event_id, now).await?;
        self.write_back(&mut detail).await;
        Ok(detail)
    }

    /// Reconciles without persisting the effective status, so a rejected
    /// command leaves the stored row untouched.
    async fn reconciled_at(
        &self,
        event_id: EventId,
        now: i64,
    ) -> Result<EventDetail, GatewayError> {
        let record = self
            .store
            .find_event(event_id)
            .await?
            .ok_or(GatewayError::EventNotFound(event_id))?;
        Ok(EventDetail::reconcile(record, now))
    }

    async fn write_back(&self, detail: &mut EventDetail) {
        if !detail.needs_status_write_back() {
            return;
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
                    "event status advanced"
                );
                detail.stored_status = detail.status;
            }
            Ok(false) => {
                tracing::debug!(%event_id, "status changed concurrently; write-back skipped");
            }
            Err(e) => {
                tracing::warn!(%event_id, error = %e, "status write-back failed");
            }
        }
    }

    /// Paginated listing; events without metadata appear with placeholders.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on storage failure.
    pub async fn list_events(
        &self,
        query: &EventQuery,
    ) -> Result<(Vec<EventDetail>, u64), GatewayError> {
        let per_page = query.per_page.max(1);
        let filter = EventFilter {
            status: query.status,
            organizer: query.organizer.clone(),
            offset: u64::from(query.page.saturating_sub(1)) * u64::from(per_page),
            limit: u64::from(per_page),
        };
        let (records, total) = self.store.list_events(&filter).await?;
        let now = unix_now();
        let mut details = Vec::with_capacity(records.len());
        for record in records {
            let mut detail = EventDetail::reconcile(record, now);
            self.write_back(&mut detail).await;
            details.push(detail);
        }
        Ok((details, total))
    }

    /// Attaches organizer-supplied metadata to an indexed event.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] if the indexer has not seen the event.
    pub async fn create_metadata(
        &self,
        event_id: EventId,
        patch: &MetadataPatch,
    ) -> Result<EventDetail, GatewayError> {
        let existing = self.current_state(event_id).await?;
        let organizer_id = self.organizer_profile_id(&existing.organizer_address).await;
        self.store
            .save_metadata(event_id, patch, organizer_id)
            .await?;
        tracing::info!(%event_id, "event metadata saved");
        self.current_state(event_id).await
    }

    /// Partially updates title, description and image.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidRequest`] for an empty patch,
    /// [`GatewayError::EventNotFound`] for unknown events.
    pub async fn update_metadata(
        &self,
        event_id: EventId,
        patch: &MetadataPatch,
    ) -> Result<EventDetail, GatewayError> {
        if patch.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "at least one of title, description or image_url is required".to_string(),
            ));
        }
        self.create_metadata(event_id, patch).await
    }

    /// Administrative status change.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Conflict`] for transitions the state machine forbids
    /// or when another writer changed the status first; a rejected change
    /// writes nothing.
    pub async fn update_status(
        &self,
        event_id: EventId,
        next: EventStatus,
    ) -> Result<EventDetail, GatewayError> {
        self.update_status_at(event_id, next, unix_now()).await
    }

    pub(crate) async fn update_status_at(
        &self,
        event_id: EventId,
        next: EventStatus,
        now: i64,
    ) -> Result<EventDetail, GatewayError> {
        let detail = self.reconciled_at(event_id, now).await?;
        let current = detail.status;
        if current == next {
            return Ok(detail);
        }
        if !current.can_transition_to(next) {
            return Err(GatewayError::conflict(format!(
                "cannot change event status from {current} to {next}"
            )));
        }
        let applied = self
            .store
            .compare_and_set_status(event_id, detail.stored_status, next)
            .await?;
        if !applied {
            return Err(GatewayError::conflict("event status changed concurrently"));
        }
        tracing::info!(%event_id, from = %current, to = %next, "event status updated");
        self.current_state_at(event_id, now).await
    }

    /// Records yields and moves a `LIVE` event to `SETTLED`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Conflict`] unless the effective status is `LIVE`;
    /// nothing is written in that case.
    pub async fn settle(
        &self,
        event_id: EventId,
        total_yield_earned: &TokenAmount,
        total_net_yield: &TokenAmount,
    ) -> Result<EventDetail, GatewayError> {
        let now = unix_now();
        self.settle_at(event_id, total_yield_earned, total_net_yield, now)
            .await
    }

    pub(crate) async fn settle_at(
        &self,
        event_id: EventId,
        total_yield_earned: &TokenAmount,
        total_net_yield: &TokenAmount,
        now: i64,
    ) -> Result<EventDetail, GatewayError> {
        let detail = self.reconciled_at(event_id, now).await?;
        if detail.status != EventStatus::Live {
            return Err(GatewayError::conflict(format!(
                "event must be LIVE to settle; current status is {}",
                detail.status
            )));
        }
        let summary = self
            .store
            .settle_event(
                event_id,
                detail.stored_status,
                total_yield_earned,
                total_net_yield,
            )
            .await?
            .ok_or_else(|| GatewayError::conflict("event status changed concurrently"))?;
        tracing::info!(
            %event_id,
            participants = summary.participants,
            attended = summary.attended,
            total_net_yield = %summary.total_net_yield,
            "event settled"
        );
        self.current_state_at(event_id, now).await
    }

    /// Logs the organizer notification for a settlement.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] for unknown events.
    pub async fn notify_settlement(
        &self,
        event_id: EventId,
    ) -> Result<SettlementNotice, GatewayError> {
        let detail = self.current_state(event_id).await?;
        tracing::info!(
            %event_id,
            organizer = %detail.organizer_address,
            status = %detail.status,
            "settlement notification sent to organizer"
        );
        Ok(SettlementNotice {
            event_id,
            organizer_address: detail.organizer_address,
            status: detail.status,
            notified_at: Utc::now(),
        })
    }

    async fn organizer_profile_id(&self, organizer: &WalletAddress) -> Option<Uuid> {
        match self.store.find_profile(organizer).await {
            Ok(profile) => profile.map(|p| p.id),
            Err(e) => {
                tracing::warn!(organizer = %organizer, error = %e, "organizer lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::chain::stub::StubChain;
    use crate::domain::event_view::fixtures::onchain;
    use crate::persistence::{EventStore, MemoryStore};

    const T0: i64 = 1_700_000_000;
    const T1: i64 = T0 + 3_600;

    fn amount(raw: &str) -> TokenAmount {
        let Ok(a) = TokenAmount::parse_decimal(raw) else {
            panic!("valid amount");
        };
        a
    }

    async fn service_with(
        events: &[(i64, i64, i64)],
        chain: StubChain,
    ) -> (EventService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        for &(id, deadline, date) in events {
            let Ok(_) = store.ingest_event(&onchain(id, deadline, date)).await else {
                panic!("ingest");
            };
        }
        let service = EventService::new(
            Arc::clone(&store) as Arc<dyn Store>,
            Arc::new(chain),
        );
        (service, store)
    }

    #[tokio::test]
    async fn timeline_for_empty_event() {
        let (service, _) = service_with(&[(42, T0, T1)], StubChain::healthy(0, 0)).await;
        let id = EventId::new(42);

        let open = service.current_state_at(id, T0 - 1).await;
        assert!(matches!(open, Ok(ref d) if d.status == EventStatus::RegistrationOpen));

        let voided = service.current_state_at(id, T0 + 1).await;
        assert!(matches!(voided, Ok(ref d) if d.status == EventStatus::Voided));
    }

    #[tokio::test]
    async fn timeline_reaches_live_without_voiding() {
        let (service, _) = service_with(&[(42, T0, T1)], StubChain::healthy(0, 0)).await;
        let live = service.current_state_at(EventId::new(42), T1 + 1).await;
        assert!(matches!(live, Ok(ref d) if d.status == EventStatus::Live));
    }

    #[tokio::test]
    async fn effective_status_is_written_back() {
        let (service, store) = service_with(&[(7, T0, T1)], StubChain::healthy(0, 0)).await;
        let _ = service.current_state_at(EventId::new(7), T1 + 5).await;
        let Ok(Some(record)) = store.find_event(EventId::new(7)).await else {
            panic!("event stored");
        };
        assert_eq!(record.metadata.map(|m| m.status), Some(EventStatus::Live));
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let (service, _) = service_with(&[], StubChain::healthy(0, 0)).await;
        assert!(matches!(
            service.get_event(EventId::new(99)).await,
            Err(GatewayError::EventNotFound(_))
        ));
    }

    #[tokio::test]
    async fn chain_failure_leaves_count_absent() {
        let now = unix_now();
        let (service, _) =
            service_with(&[(3, now + 100, now + 200)], StubChain::failing()).await;
        let detail = service.get_event(EventId::new(3)).await;
        assert!(matches!(detail, Ok(ref d) if d.onchain_participant_count.is_none()));

        let (healthy, _) =
            service_with(&[(3, now + 100, now + 200)], StubChain::healthy(0, 4)).await;
        let detail = healthy.get_event(EventId::new(3)).await;
        assert!(matches!(detail, Ok(ref d) if d.onchain_participant_count.as_deref() == Some("4")));
    }

    #[tokio::test]
    async fn settle_requires_live_and_mutates_nothing_otherwise() {
        let (service, store) = service_with(&[(9, T0, T1)], StubChain::healthy(0, 0)).await;
        let id = EventId::new(9);

        let early = service.settle_at(id, &amount("10"), &amount("9"), T0 - 10).await;
        assert!(matches!(early, Err(GatewayError::Conflict(_))));
        let Ok(Some(record)) = store.find_event(id).await else {
            panic!("event stored");
        };
        let meta = record.metadata.unwrap_or_else(|| panic!("metadata row"));
        assert_eq!(meta.status, EventStatus::RegistrationOpen);
        assert!(meta.settlement.is_none());

        let settled = service.settle_at(id, &amount("10"), &amount("9.5"), T1 + 10).await;
        let Ok(settled) = settled else {
            panic!("settle LIVE event");
        };
        assert_eq!(settled.status, EventStatus::Settled);
        assert_eq!(
            settled.settlement.map(|s| s.total_net_yield),
            Some(amount("9.5"))
        );

        let again = service.settle_at(id, &amount("1"), &amount("1"), T1 + 20).await;
        assert!(matches!(again, Err(GatewayError::Conflict(_))));
    }

    async fn stored_status(store: &MemoryStore, id: EventId) -> Option<EventStatus> {
        let Ok(Some(record)) = store.find_event(id).await else {
            panic!("event stored");
        };
        record.metadata.map(|m| m.status)
    }

    #[tokio::test]
    async fn rejected_settle_in_closed_window_keeps_stored_status() {
        let (service, store) = service_with(&[(42, T0, T1)], StubChain::healthy(0, 0)).await;
        let id = EventId::new(42);

        let rejected = service.settle_at(id, &amount("1"), &amount("1"), T0 + 1).await;
        assert!(matches!(rejected, Err(GatewayError::Conflict(_))));
        assert_eq!(
            stored_status(&store, id).await,
            Some(EventStatus::RegistrationOpen)
        );

        let settled = service.settle_at(id, &amount("1"), &amount("1"), T1 + 1).await;
        assert!(matches!(settled, Ok(ref d) if d.status == EventStatus::Settled));
        assert_eq!(stored_status(&store, id).await, Some(EventStatus::Settled));
    }

    #[tokio::test]
    async fn rejected_transition_keeps_stored_status() {
        let (service, store) = service_with(&[(43, T0, T1)], StubChain::healthy(0, 0)).await;
        let id = EventId::new(43);

        // Effective status is VOIDED at T0 + 1, which cannot move to LIVE.
        let rejected = service.update_status_at(id, EventStatus::Live, T0 + 1).await;
        assert!(matches!(rejected, Err(GatewayError::Conflict(_))));
        assert_eq!(
            stored_status(&store, id).await,
            Some(EventStatus::RegistrationOpen)
        );
    }

    #[tokio::test]
    async fn admin_transitions_follow_state_machine() {
        let now = unix_now();
        let (service, _) =
            service_with(&[(4, now + 100, now + 200)], StubChain::healthy(0, 0)).await;
        let id = EventId::new(4);

        let same = service.update_status(id, EventStatus::RegistrationOpen).await;
        assert!(matches!(same, Ok(ref d) if d.status == EventStatus::RegistrationOpen));

        assert!(matches!(
            service.update_status(id, EventStatus::Settled).await,
            Err(GatewayError::Conflict(_))
        ));

        let voided = service.update_status(id, EventStatus::Voided).await;
        assert!(matches!(voided, Ok(ref d) if d.status == EventStatus::Voided));

        assert!(matches!(
            service.update_status(id, EventStatus::Live).await,
            Err(GatewayError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn metadata_requires_indexed_event() {
        let (service, _) = service_with(&[(1, T0, T1)], StubChain::healthy(0, 0)).await;
        let patch = MetadataPatch {
            title: Some("Launch party".to_string()),
            ..MetadataPatch::default()
        };
        assert!(matches!(
            service.create_metadata(EventId::new(2), &patch).await,
            Err(GatewayError::EventNotFound(_))
        ));
        let created = service.create_metadata(EventId::new(1), &patch).await;
        assert!(matches!(created, Ok(ref d) if d.title == "Launch party"));

        assert!(matches!(
            service.update_metadata(EventId::new(1), &MetadataPatch::default()).await,
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn listing_paginates_newest_first() {
        let now = unix_now();
        let events: Vec<(i64, i64, i64)> = (1..=5).map(|id| (id, now + 100, now + 200)).collect();
        let (service, _) = service_with(&events, StubChain::healthy(0, 0)).await;
        let query = EventQuery {
            page: 2,
            per_page: 2,
            ..EventQuery::default()
        };
        let Ok((page, total)) = service.list_events(&query).await else {
            panic!("list");
        };
        assert_eq!(total, 5);
        let ids: Vec<i64> = page.iter().map(|d| d.event_id.get()).collect();
        assert_eq!(ids, vec![3, 2]);
    }
}
