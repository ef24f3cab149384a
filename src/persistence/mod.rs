//! Persistence layer: profiles, events, participants and check-ins.
//!
//! Services talk to storage only through the traits below, bundled as
//! [`Store`]. [`PostgresStore`] is the production backend using
//! `sqlx::PgPool`; [`MemoryStore`] keeps everything in process and backs
//! the test suite and `PERSISTENCE_ENABLED=false` runs.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Checkin, CheckinReview, EventId, EventRecord, EventStatus, MetadataPatch, NewRegistration,
    OnchainEvent, Participant, ParticipantWithProfile, Profile, ProfilePatch, SettlementSummary,
    TokenAmount, WalletAddress,
};
use crate::error::GatewayError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Filters and window for event listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Stored status; events without metadata count as `REGISTRATION_OPEN`.
    pub status: Option<EventStatus>,
    /// Organizer wallet.
    pub organizer: Option<WalletAddress>,
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
}

/// What an indexer upsert did to the stored rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Identifier of the stored row, which for a known transaction hash is
    /// the one it was first indexed under.
    pub event_id: EventId,
    /// `false` when an existing on-chain row was overwritten.
    pub onchain_inserted: bool,
    /// `true` when a placeholder metadata row was created.
    pub metadata_created: bool,
}

/// Wallet-keyed profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync + std::fmt::Debug {
    /// Inserts a new profile.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Conflict`] if the wallet already has a profile.
    async fn create_profile(
        &self,
        wallet: &WalletAddress,
        patch: &ProfilePatch,
    ) -> Result<Profile, GatewayError>;

    /// Looks up a profile by wallet.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn find_profile(&self, wallet: &WalletAddress) -> Result<Option<Profile>, GatewayError>;

    /// Applies `patch` to an existing profile; `None` if there is none.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn update_profile(
        &self,
        wallet: &WalletAddress,
        patch: &ProfilePatch,
    ) -> Result<Option<Profile>, GatewayError>;

    /// Creates the profile or applies `patch` to the existing one.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn upsert_profile(
        &self,
        wallet: &WalletAddress,
        patch: &ProfilePatch,
    ) -> Result<Profile, GatewayError>;
}

/// On-chain events and their off-chain metadata.
#[async_trait]
pub trait EventStore: Send + Sync + std::fmt::Debug {
    /// Loads one event with metadata, organizer name and live counts.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn find_event(&self, event_id: EventId) -> Result<Option<EventRecord>, GatewayError>;

    /// Lists events newest first, returning the page and the total match count.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn list_events(
        &self,
        filter: &EventFilter,
    ) -> Result<(Vec<EventRecord>, u64), GatewayError>;

    /// Events whose stored status is not terminal.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn list_active_events(&self) -> Result<Vec<EventRecord>, GatewayError>;

    /// Upserts the on-chain row keyed by transaction hash and creates
    /// placeholder metadata if none exists, in one transaction.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure, including an
    /// `event_id` already bound to a different transaction.
    async fn ingest_event(&self, event: &OnchainEvent) -> Result<IngestOutcome, GatewayError>;

    /// Creates the metadata row if missing, then applies `patch`.
    /// An existing status is kept.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn save_metadata(
        &self,
        event_id: EventId,
        patch: &MetadataPatch,
        organizer_id: Option<Uuid>,
    ) -> Result<(), GatewayError>;

    /// Sets `next` only if the stored status is still `expected`.
    /// A missing metadata row is treated as `REGISTRATION_OPEN` and created.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn compare_and_set_status(
        &self,
        event_id: EventId,
        expected: EventStatus,
        next: EventStatus,
    ) -> Result<bool, GatewayError>;

    /// Records yields, freezes counts and moves to `SETTLED`, provided the
    /// stored status is still `expected`. `None` if the guard failed.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn settle_event(
        &self,
        event_id: EventId,
        expected: EventStatus,
        total_yield_earned: &TokenAmount,
        total_net_yield: &TokenAmount,
    ) -> Result<Option<SettlementSummary>, GatewayError>;

    /// Round-trips to the backend.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] if the backend is unreachable.
    async fn ping(&self) -> Result<(), GatewayError>;
}

/// Event registrations.
#[async_trait]
pub trait ParticipantStore: Send + Sync + std::fmt::Debug {
    /// Registers a profile, refusing when `max_participants` is reached.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Conflict`] if already registered or the event is full.
    async fn register_participant(
        &self,
        registration: &NewRegistration,
        max_participants: i64,
    ) -> Result<Participant, GatewayError>;

    /// One participant by wallet.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn find_participant(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<Option<Participant>, GatewayError>;

    /// Deletes a registration that has not attended. `false` if nothing matched.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn withdraw_participant(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<bool, GatewayError>;

    /// All participants with profile details, oldest registration first.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn list_participants(
        &self,
        event_id: EventId,
    ) -> Result<Vec<ParticipantWithProfile>, GatewayError>;

    /// Wallets of attended participants.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn attended_wallets(&self, event_id: EventId)
    -> Result<Vec<WalletAddress>, GatewayError>;

    /// Sets `is_attended`. `false` if the wallet is not registered.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn mark_attended(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<bool, GatewayError>;

    /// Sets `is_claimed` on an attended, unclaimed participant.
    /// `false` if that guard failed.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn mark_claimed(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<bool, GatewayError>;
}

/// QR check-in proofs.
#[async_trait]
pub trait CheckinStore: Send + Sync + std::fmt::Debug {
    /// Inserts a check-in.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Conflict`] if the wallet already checked in.
    async fn create_checkin(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
        qr_data: &str,
    ) -> Result<Checkin, GatewayError>;

    /// One check-in by id.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn find_checkin(&self, id: Uuid) -> Result<Option<Checkin>, GatewayError>;

    /// Records a review unless the check-in is already validated.
    /// `None` if that guard failed.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn review_checkin(
        &self,
        id: Uuid,
        review: &CheckinReview,
    ) -> Result<Option<Checkin>, GatewayError>;

    /// All check-ins for an event, newest first.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on storage failure.
    async fn list_checkins(&self, event_id: EventId) -> Result<Vec<Checkin>, GatewayError>;
}

/// Every storage capability the services need.
pub trait Store: ProfileStore + EventStore + ParticipantStore + CheckinStore {}

impl<T> Store for T where T: ProfileStore + EventStore + ParticipantStore + CheckinStore {}
