//! In-process store with the same semantics as the PostgreSQL backend.
//!
//! All tables sit behind one [`tokio::sync::RwLock`], so every trait
//! method is atomic with respect to the others, the way a single SQL
//! transaction would be.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CheckinStore, EventFilter, EventStore, IngestOutcome, ParticipantStore, ProfileStore,
};
use crate::domain::{
    Checkin, CheckinReview, EventId, EventMetadata, EventRecord, EventStatus, MetadataPatch,
    NewRegistration, OnchainEvent, Participant, ParticipantCounts, ParticipantWithProfile,
    Profile, ProfilePatch, SettlementSummary, TokenAmount, WalletAddress,
};
use crate::error::GatewayError;

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<WalletAddress, Profile>,
    onchain: BTreeMap<EventId, OnchainEvent>,
    metadata: HashMap<EventId, EventMetadata>,
    participants: Vec<Participant>,
    checkins: Vec<Checkin>,
}

impl Tables {
    fn counts(&self, event_id: EventId) -> ParticipantCounts {
        self.participants
            .iter()
            .filter(|p| p.event_id == event_id)
            .fold(ParticipantCounts::default(), |mut acc, p| {
                acc.registered += 1;
                if p.is_attended {
                    acc.attended += 1;
                }
                acc
            })
    }

    fn record(&self, onchain: &OnchainEvent) -> EventRecord {
        EventRecord {
            onchain: onchain.clone(),
            metadata: self.metadata.get(&onchain.event_id).cloned(),
            organizer_name: self
                .profiles
                .get(&onchain.organizer_address)
                .and_then(|p| p.name.clone()),
            counts: self.counts(onchain.event_id),
        }
    }

    fn stored_status(&self, event_id: EventId) -> EventStatus {
        self.metadata
            .get(&event_id)
            .map_or(EventStatus::RegistrationOpen, |m| m.status)
    }

    fn metadata_or_placeholder(&mut self, event_id: EventId) -> &mut EventMetadata {
        self.metadata
            .entry(event_id)
            .or_insert_with(|| EventMetadata::placeholder(event_id))
    }

    fn participant_mut(
        &mut self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Option<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|p| p.event_id == event_id && &p.wallet_address == wallet)
    }
}

/// Store backed by in-process maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn create_profile(
        &self,
        wallet: &WalletAddress,
        patch: &ProfilePatch,
    ) -> Result<Profile, GatewayError> {
        let mut tables = self.tables.write().await;
        if tables.profiles.contains_key(wallet) {
            return Err(GatewayError::conflict("profile already exists for this wallet"));
        }
        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            wallet_address: wallet.clone(),
            name: patch.name.clone(),
            email: patch.email.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.profiles.insert(wallet.clone(), profile.clone());
        Ok(profile)
    }

    async fn find_profile(&self, wallet: &WalletAddress) -> Result<Option<Profile>, GatewayError> {
        Ok(self.tables.read().await.profiles.get(wallet).cloned())
    }

    async fn update_profile(
        &self,
        wallet: &WalletAddress,
        patch: &ProfilePatch,
    ) -> Result<Option<Profile>, GatewayError> {
        let mut tables = self.tables.write().await;
        Ok(tables.profiles.get_mut(wallet).map(|profile| {
            patch.apply_to(profile);
            profile.updated_at = Utc::now();
            profile.clone()
        }))
    }

    async fn upsert_profile(
        &self,
        wallet: &WalletAddress,
        patch: &ProfilePatch,
    ) -> Result<Profile, GatewayError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let profile = tables
            .profiles
            .entry(wallet.clone())
            .and_modify(|p| {
                patch.apply_to(p);
                p.updated_at = now;
            })
            .or_insert_with(|| Profile {
                id: Uuid::new_v4(),
                wallet_address: wallet.clone(),
                name: patch.name.clone(),
                email: patch.email.clone(),
                created_at: now,
                updated_at: now,
            });
        Ok(profile.clone())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn find_event(&self, event_id: EventId) -> Result<Option<EventRecord>, GatewayError> {
        let tables = self.tables.read().await;
        Ok(tables.onchain.get(&event_id).map(|e| tables.record(e)))
    }

    async fn list_events(
        &self,
        filter: &EventFilter,
    ) -> Result<(Vec<EventRecord>, u64), GatewayError> {
        let tables = self.tables.read().await;
        let matching: Vec<&OnchainEvent> = tables
            .onchain
            .values()
            .rev()
            .filter(|e| filter.status.is_none_or(|s| tables.stored_status(e.event_id) == s))
            .filter(|e| {
                filter
                    .organizer
                    .as_ref()
                    .is_none_or(|o| &e.organizer_address == o)
            })
            .collect();
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(filter.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(filter.limit).unwrap_or(usize::MAX))
            .map(|e| tables.record(e))
            .collect();
        Ok((page, total))
    }

    async fn list_active_events(&self) -> Result<Vec<EventRecord>, GatewayError> {
        let tables = self.tables.read().await;
        Ok(tables
            .onchain
            .values()
            .filter(|e| !tables.stored_status(e.event_id).is_terminal())
            .map(|e| tables.record(e))
            .collect())
    }

    async fn ingest_event(&self, event: &OnchainEvent) -> Result<IngestOutcome, GatewayError> {
        let mut tables = self.tables.write().await;
        let organizer_id = tables.profiles.get(&event.organizer_address).map(|p| p.id);

        let existing = tables
            .onchain
            .values()
            .find(|e| e.transaction_hash == event.transaction_hash)
            .map(|e| e.event_id);

        let (stored_id, onchain_inserted) = match existing {
            Some(stored_id) => {
                if let Some(row) = tables.onchain.get_mut(&stored_id) {
                    let block_number = event.block_number.or(row.block_number);
                    *row = OnchainEvent {
                        event_id: stored_id,
                        block_number,
                        ..event.clone()
                    };
                }
                (stored_id, false)
            }
            None => {
                if tables.onchain.contains_key(&event.event_id) {
                    return Err(GatewayError::PersistenceError(format!(
                        "duplicate key: event {} already indexed under another transaction",
                        event.event_id
                    )));
                }
                tables.onchain.insert(event.event_id, event.clone());
                (event.event_id, true)
            }
        };

        let metadata_created = !tables.metadata.contains_key(&stored_id);
        if metadata_created {
            let mut placeholder = EventMetadata::placeholder(stored_id);
            placeholder.organizer_id = organizer_id;
            tables.metadata.insert(stored_id, placeholder);
        }

        Ok(IngestOutcome {
            event_id: stored_id,
            onchain_inserted,
            metadata_created,
        })
    }

    async fn save_metadata(
        &self,
        event_id: EventId,
        patch: &MetadataPatch,
        organizer_id: Option<Uuid>,
    ) -> Result<(), GatewayError> {
        let mut tables = self.tables.write().await;
        let current = tables.metadata_or_placeholder(event_id);
        *current = patch.apply(current.clone());
        if current.organizer_id.is_none() {
            current.organizer_id = organizer_id;
        }
        Ok(())
    }

    async fn compare_and_set_status(
        &self,
        event_id: EventId,
        expected: EventStatus,
        next: EventStatus,
    ) -> Result<bool, GatewayError> {
        let mut tables = self.tables.write().await;
        if tables.stored_status(event_id) != expected {
            return Ok(false);
        }
        tables.metadata_or_placeholder(event_id).status = next;
        Ok(true)
    }

    async fn settle_event(
        &self,
        event_id: EventId,
        expected: EventStatus,
        total_yield_earned: &TokenAmount,
        total_net_yield: &TokenAmount,
    ) -> Result<Option<SettlementSummary>, GatewayError> {
        let mut tables = self.tables.write().await;
        if tables.stored_status(event_id) != expected {
            return Ok(None);
        }
        let counts = tables.counts(event_id);
        let summary = SettlementSummary {
            total_yield_earned: total_yield_earned.clone(),
            total_net_yield: total_net_yield.clone(),
            participants: counts.registered,
            attended: counts.attended,
            settled_at: Utc::now(),
        };
        let metadata = tables.metadata_or_placeholder(event_id);
        metadata.status = EventStatus::Settled;
        metadata.settlement = Some(summary.clone());
        Ok(Some(summary))
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[async_trait]
impl ParticipantStore for MemoryStore {
    async fn register_participant(
        &self,
        registration: &NewRegistration,
        max_participants: i64,
    ) -> Result<Participant, GatewayError> {
        let mut tables = self.tables.write().await;
        let event_id = registration.event_id;
        if !tables.onchain.contains_key(&event_id) {
            return Err(GatewayError::EventNotFound(event_id));
        }
        let wallet = tables
            .profiles
            .values()
            .find(|p| p.id == registration.user_id)
            .map(|p| p.wallet_address.clone())
            .ok_or_else(|| {
                GatewayError::PersistenceError(format!(
                    "foreign key: profile {} does not exist",
                    registration.user_id
                ))
            })?;
        if tables
            .participants
            .iter()
            .any(|p| p.event_id == event_id && p.user_id == registration.user_id)
        {
            return Err(GatewayError::conflict("user already registered for this event"));
        }
        if tables.counts(event_id).registered >= max_participants {
            return Err(GatewayError::conflict("event is full"));
        }

        let now = Utc::now();
        let participant = Participant {
            id: Uuid::new_v4(),
            event_id,
            user_id: registration.user_id,
            wallet_address: wallet,
            is_attended: false,
            is_claimed: false,
            deposit_tx_hash: Some(registration.deposit_tx_hash.clone()),
            deposit_amount: Some(registration.deposit_amount.clone()),
            created_at: now,
            updated_at: now,
        };
        tables.participants.push(participant.clone());
        Ok(participant)
    }

    async fn find_participant(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<Option<Participant>, GatewayError> {
        let tables = self.tables.read().await;
        Ok(tables
            .participants
            .iter()
            .find(|p| p.event_id == event_id && &p.wallet_address == wallet)
            .cloned())
    }

    async fn withdraw_participant(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<bool, GatewayError> {
        let mut tables = self.tables.write().await;
        let before = tables.participants.len();
        tables
            .participants
            .retain(|p| !(p.event_id == event_id && &p.wallet_address == wallet && !p.is_attended));
        Ok(tables.participants.len() < before)
    }

    async fn list_participants(
        &self,
        event_id: EventId,
    ) -> Result<Vec<ParticipantWithProfile>, GatewayError> {
        let tables = self.tables.read().await;
        Ok(tables
            .participants
            .iter()
            .filter(|p| p.event_id == event_id)
            .map(|p| {
                let profile = tables.profiles.get(&p.wallet_address);
                ParticipantWithProfile {
                    participant: p.clone(),
                    name: profile.and_then(|pr| pr.name.clone()),
                    email: profile.and_then(|pr| pr.email.clone()),
                }
            })
            .collect())
    }

    async fn attended_wallets(
        &self,
        event_id: EventId,
    ) -> Result<Vec<WalletAddress>, GatewayError> {
        let tables = self.tables.read().await;
        Ok(tables
            .participants
            .iter()
            .filter(|p| p.event_id == event_id && p.is_attended)
            .map(|p| p.wallet_address.clone())
            .collect())
    }

    async fn mark_attended(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<bool, GatewayError> {
        let mut tables = self.tables.write().await;
        let Some(p) = tables.participant_mut(event_id, wallet) else {
            return Ok(false);
        };
        p.is_attended = true;
        p.updated_at = Utc::now();
        Ok(true)
    }

    async fn mark_claimed(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<bool, GatewayError> {
        let mut tables = self.tables.write().await;
        match tables.participant_mut(event_id, wallet) {
            Some(p) if p.is_attended && !p.is_claimed => {
                p.is_claimed = true;
                p.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl CheckinStore for MemoryStore {
    async fn create_checkin(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
        qr_data: &str,
    ) -> Result<Checkin, GatewayError> {
        let mut tables = self.tables.write().await;
        if !tables.onchain.contains_key(&event_id) {
            return Err(GatewayError::PersistenceError(format!(
                "foreign key: event {event_id} does not exist"
            )));
        }
        if tables
            .checkins
            .iter()
            .any(|c| c.event_id == event_id && &c.wallet_address == wallet)
        {
            return Err(GatewayError::conflict("already checked in to this event"));
        }
        let checkin = Checkin {
            id: Uuid::new_v4(),
            event_id,
            wallet_address: wallet.clone(),
            qr_data: qr_data.to_string(),
            checked_in_at: Utc::now(),
            is_validated: false,
            validated_at: None,
            validated_by: None,
        };
        tables.checkins.push(checkin.clone());
        Ok(checkin)
    }

    async fn find_checkin(&self, id: Uuid) -> Result<Option<Checkin>, GatewayError> {
        let tables = self.tables.read().await;
        Ok(tables.checkins.iter().find(|c| c.id == id).cloned())
    }

    async fn review_checkin(
        &self,
        id: Uuid,
        review: &CheckinReview,
    ) -> Result<Option<Checkin>, GatewayError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .checkins
            .iter_mut()
            .find(|c| c.id == id && !c.is_validated)
            .map(|c| {
                c.is_validated = review.is_valid;
                c.validated_at = Some(review.reviewed_at);
                c.validated_by = Some(review.reviewer.clone());
                c.clone()
            }))
    }

    async fn list_checkins(&self, event_id: EventId) -> Result<Vec<Checkin>, GatewayError> {
        let tables = self.tables.read().await;
        Ok(tables
            .checkins
            .iter()
            .rev()
            .filter(|c| c.event_id == event_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::TxHash;
    use crate::domain::event_view::fixtures::onchain;

    fn wallet(n: u8) -> WalletAddress {
        let Ok(w) = WalletAddress::parse(&format!("0x{}", format!("{n:02x}").repeat(20))) else {
            panic!("valid wallet");
        };
        w
    }

    fn registration(event_id: EventId, user_id: Uuid) -> NewRegistration {
        let Ok(tx) = TxHash::parse(&format!("0x{}", "ab".repeat(32))) else {
            panic!("valid hash");
        };
        let Ok(amount) = TokenAmount::parse_integer("5000000") else {
            panic!("valid amount");
        };
        NewRegistration {
            event_id,
            user_id,
            deposit_tx_hash: tx,
            deposit_amount: amount,
        }
    }

    #[tokio::test]
    async fn reingest_keeps_metadata() {
        let store = MemoryStore::new();
        let event = onchain(5, 100, 200);
        let Ok(first) = store.ingest_event(&event).await else {
            panic!("ingest");
        };
        assert!(first.onchain_inserted && first.metadata_created);

        let patch = MetadataPatch {
            title: Some("Rust meetup".to_string()),
            ..MetadataPatch::default()
        };
        assert!(store.save_metadata(EventId::new(5), &patch, None).await.is_ok());

        let Ok(second) = store.ingest_event(&event).await else {
            panic!("re-ingest");
        };
        assert!(!second.onchain_inserted && !second.metadata_created);

        let Ok(Some(record)) = store.find_event(EventId::new(5)).await else {
            panic!("event stored");
        };
        assert_eq!(record.metadata.map(|m| m.title).as_deref(), Some("Rust meetup"));
    }

    #[tokio::test]
    async fn registration_respects_cap_and_uniqueness() {
        let store = MemoryStore::new();
        let _ = store.ingest_event(&onchain(1, 100, 200)).await;
        let Ok(alice) = store.upsert_profile(&wallet(0xa1), &ProfilePatch::default()).await else {
            panic!("profile");
        };
        let Ok(bob) = store.upsert_profile(&wallet(0xb2), &ProfilePatch::default()).await else {
            panic!("profile");
        };

        assert!(
            store
                .register_participant(&registration(EventId::new(1), alice.id), 1)
                .await
                .is_ok()
        );
        assert!(matches!(
            store.register_participant(&registration(EventId::new(1), alice.id), 5).await,
            Err(GatewayError::Conflict(_))
        ));
        assert!(matches!(
            store.register_participant(&registration(EventId::new(1), bob.id), 1).await,
            Err(GatewayError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn status_cas_requires_expected() {
        let store = MemoryStore::new();
        let _ = store.ingest_event(&onchain(2, 100, 200)).await;
        let id = EventId::new(2);
        assert!(matches!(
            store.compare_and_set_status(id, EventStatus::Live, EventStatus::Settled).await,
            Ok(false)
        ));
        assert!(matches!(
            store
                .compare_and_set_status(id, EventStatus::RegistrationOpen, EventStatus::Live)
                .await,
            Ok(true)
        ));
    }

    #[tokio::test]
    async fn list_filters_by_stored_status() {
        let store = MemoryStore::new();
        for id in 1..=3 {
            let _ = store.ingest_event(&onchain(id, 100, 200)).await;
        }
        let _ = store
            .compare_and_set_status(
                EventId::new(2),
                EventStatus::RegistrationOpen,
                EventStatus::Live,
            )
            .await;
        let filter = EventFilter {
            status: Some(EventStatus::RegistrationOpen),
            limit: 10,
            ..EventFilter::default()
        };
        let Ok((page, total)) = store.list_events(&filter).await else {
            panic!("list");
        };
        assert_eq!(total, 2);
        let ids: Vec<i64> = page.iter().map(|r| r.onchain.event_id.get()).collect();
        assert_eq!(ids, vec![3, 1]);
    }
}
