//! Reconciled view of an event: on-chain facts joined with off-chain
//! metadata and derived participant counts.

use serde::Serialize;
use utoipa::ToSchema;

use super::amount::TokenAmount;
use super::address::{TxHash, WalletAddress};
use super::event_id::EventId;
use super::event_metadata::{EventMetadata, SettlementSummary};
use super::event_status::{EventStatus, derive_status};
use super::onchain_event::OnchainEvent;

/// Participant totals computed from the `participants` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ParticipantCounts {
    /// Registered participants.
    pub registered: i64,
    /// Participants marked attended.
    pub attended: i64,
}

/// Everything the store knows about one event, before reconciliation.
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// Immutable on-chain row.
    pub onchain: OnchainEvent,
    /// Metadata row, absent until created.
    pub metadata: Option<EventMetadata>,
    /// Organizer display name from their profile.
    pub organizer_name: Option<String>,
    /// Live participant totals.
    pub counts: ParticipantCounts,
}

/// Complete event as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EventDetail {
    /// Contract-assigned identifier.
    pub event_id: EventId,
    /// Vault contract address.
    pub vault_address: WalletAddress,
    /// Organizer wallet.
    pub organizer_address: WalletAddress,
    /// Organizer display name, if they have a profile.
    pub organizer_name: Option<String>,
    /// Stake per participant in token base units.
    pub stake_amount: TokenAmount,
    /// Participant cap.
    pub max_participants: i64,
    /// Unix seconds.
    pub registration_deadline: i64,
    /// Unix seconds.
    pub event_date: i64,
    /// Emitting transaction.
    pub transaction_hash: TxHash,
    /// Display title.
    pub title: String,
    /// Long-form description.
    pub description: Option<String>,
    /// Cover image.
    pub image_url: Option<String>,
    /// Effective status after applying the clock.
    pub status: EventStatus,
    /// Status as last persisted.
    pub stored_status: EventStatus,
    /// Registered participants (frozen once settled).
    pub current_participants: i64,
    /// Attended participants (frozen once settled).
    pub attended_participants: i64,
    /// Count reported by the vault contract; absent if the call failed.
    pub onchain_participant_count: Option<String>,
    /// Settlement figures, once settled.
    pub settlement: Option<SettlementSummary>,
    /// `true` when no metadata row exists yet and defaults were used.
    pub metadata_synthesized: bool,
}

impl EventDetail {
    /// Merges on-chain facts, metadata and counts as of `now` (Unix seconds).
    ///
    /// Missing metadata is replaced by [`EventMetadata::placeholder`].
    #[must_use]
    pub fn reconcile(record: EventRecord, now: i64) -> Self {
        let EventRecord {
            onchain,
            metadata,
            organizer_name,
            counts,
        } = record;
        let metadata_synthesized = metadata.is_none();
        let metadata = metadata.unwrap_or_else(|| EventMetadata::placeholder(onchain.event_id));

        let (current_participants, attended_participants) = match &metadata.settlement {
            Some(summary) => (summary.participants, summary.attended),
            None => (counts.registered, counts.attended),
        };

        let derived = derive_status(
            now,
            onchain.registration_deadline,
            onchain.event_date,
            current_participants,
        );
        let status = metadata.status.advance(derived);

        Self {
            event_id: onchain.event_id,
            vault_address: onchain.vault_address,
            organizer_address: onchain.organizer_address,
            organizer_name,
            stake_amount: onchain.stake_amount,
            max_participants: onchain.max_participants,
            registration_deadline: onchain.registration_deadline,
            event_date: onchain.event_date,
            transaction_hash: onchain.transaction_hash,
            title: metadata.title,
            description: metadata.description,
            image_url: metadata.image_url,
            status,
            stored_status: metadata.status,
            current_participants,
            attended_participants,
            onchain_participant_count: None,
            settlement: metadata.settlement,
            metadata_synthesized,
        }
    }

    /// Whether the effective status should be written back to the store.
    #[must_use]
    pub fn needs_status_write_back(&self) -> bool {
        !self.metadata_synthesized && self.status != self.stored_status
    }

    /// `true` when the participant cap has been reached.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.current_participants >= self.max_participants
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) fn onchain(id: i64, deadline: i64, event_date: i64) -> OnchainEvent {
        let Ok(vault) = WalletAddress::parse(&format!("0x{:040x}", 0x1000 + id)) else {
            panic!("fixture address is valid");
        };
        let Ok(organizer) = WalletAddress::parse("0x2222222222222222222222222222222222222222")
        else {
            panic!("fixture address is valid");
        };
        let Ok(stake) = TokenAmount::parse_integer("5000000") else {
            panic!("fixture amount is valid");
        };
        let Ok(tx) = TxHash::parse(&format!("0x{id:064x}")) else {
            panic!("fixture hash is valid");
        };
        OnchainEvent {
            event_id: EventId::new(id),
            vault_address: vault,
            organizer_address: organizer,
            stake_amount: stake,
            max_participants: 10,
            registration_deadline: deadline,
            event_date,
            transaction_hash: tx,
            block_number: Some(1),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::fixtures::onchain;
    use super::*;

    const T0: i64 = 1_700_000_000;
    const T1: i64 = T0 + 3_600;

    fn record(metadata: Option<EventMetadata>, registered: i64) -> EventRecord {
        EventRecord {
            onchain: onchain(42, T0, T1),
            metadata,
            organizer_name: None,
            counts: ParticipantCounts {
                registered,
                attended: 0,
            },
        }
    }

    #[test]
    fn missing_metadata_is_synthesized() {
        let detail = EventDetail::reconcile(record(None, 0), T0 - 100);
        assert!(detail.metadata_synthesized);
        assert_eq!(detail.title, "Event #42");
        assert_eq!(detail.status, EventStatus::RegistrationOpen);
        assert!(!detail.needs_status_write_back());
    }

    #[test]
    fn effective_status_follows_clock() {
        let meta = EventMetadata::placeholder(EventId::new(42));
        let closed = EventDetail::reconcile(record(Some(meta.clone()), 2), T0 + 1);
        assert_eq!(closed.status, EventStatus::RegistrationClosed);
        assert_eq!(closed.stored_status, EventStatus::RegistrationOpen);
        assert!(closed.needs_status_write_back());

        let voided = EventDetail::reconcile(record(Some(meta), 0), T0 + 1);
        assert_eq!(voided.status, EventStatus::Voided);
    }

    #[test]
    fn settled_counts_are_frozen() {
        let mut meta = EventMetadata::placeholder(EventId::new(42));
        meta.status = EventStatus::Settled;
        meta.settlement = Some(SettlementSummary {
            total_yield_earned: TokenAmount::parse_decimal("10")
                .unwrap_or_else(|_| panic!("valid amount")),
            total_net_yield: TokenAmount::parse_decimal("9")
                .unwrap_or_else(|_| panic!("valid amount")),
            participants: 5,
            attended: 4,
            settled_at: chrono::Utc::now(),
        });
        let detail = EventDetail::reconcile(record(Some(meta), 7), T1 + 100);
        assert_eq!(detail.status, EventStatus::Settled);
        assert_eq!(detail.current_participants, 5);
        assert_eq!(detail.attended_participants, 4);
    }

    #[test]
    fn full_when_cap_reached() {
        let detail = EventDetail::reconcile(record(None, 10), T0 - 1);
        assert!(detail.is_full());
    }
}
