//! Registration service: joining, leaving and claiming for events.

use std::sync::Arc;

use crate::domain::participant::ClaimRefusal;
use crate::domain::{
    EventId, EventStatus, NewRegistration, Participant, ParticipantWithProfile, ProfilePatch,
    TokenAmount, TxHash, WalletAddress,
};
use crate::error::GatewayError;
use crate::persistence::Store;

use super::EventService;

/// Registration request after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterInput {
    /// Registering wallet.
    pub wallet: WalletAddress,
    /// Deposit transaction.
    pub transaction_hash: TxHash,
    /// Deposit amount.
    pub deposit_amount: TokenAmount,
}

/// Participant lifecycle for one event.
#[derive(Debug, Clone)]
pub struct RegistrationService {
    store: Arc<dyn Store>,
    events: Arc<EventService>,
}

impl RegistrationService {
    /// Creates a new `RegistrationService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, events: Arc<EventService>) -> Self {
        Self { store, events }
    }

    /// Registers a wallet, creating its profile on first use.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Conflict`] when registration is not open, the event
    /// is full, or the wallet is already registered.
    pub async fn register(
        &self,
        event_id: EventId,
        input: &RegisterInput,
    ) -> Result<Participant, GatewayError> {
        let event = self.events.current_state(event_id).await?;
        if event.status != EventStatus::RegistrationOpen {
            return Err(GatewayError::conflict(format!(
                "registration is closed; event status is {}",
                event.status
            )));
        }
        if event.is_full() {
            return Err(GatewayError::conflict("event is full"));
        }

        let profile = self
            .store
            .upsert_profile(&input.wallet, &ProfilePatch::default())
            .await?;
        let registration = NewRegistration {
            event_id,
            user_id: profile.id,
            deposit_tx_hash: input.transaction_hash.clone(),
            deposit_amount: input.deposit_amount.clone(),
        };
        let participant = self
            .store
            .register_participant(&registration, event.max_participants)
            .await?;
        tracing::info!(%event_id, wallet = %input.wallet, "participant registered");
        Ok(participant)
    }

    /// Removes a registration while registration is still open.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ParticipantNotFound`] if the wallet is not registered,
    /// [`GatewayError::Conflict`] if registration closed or the participant
    /// already attended.
    pub async fn withdraw(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<(), GatewayError> {
        let event = self.events.current_state(event_id).await?;
        let participant = self.require_participant(event_id, wallet).await?;
        if event.status != EventStatus::RegistrationOpen {
            return Err(GatewayError::conflict(format!(
                "cannot withdraw; event status is {}",
                event.status
            )));
        }
        if participant.is_attended {
            return Err(GatewayError::conflict("cannot withdraw after attending"));
        }
        if !self.store.withdraw_participant(event_id, wallet).await? {
            return Err(GatewayError::conflict("participant changed concurrently"));
        }
        tracing::info!(%event_id, wallet = %wallet, "participant withdrew");
        Ok(())
    }

    /// One registration.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] or [`GatewayError::ParticipantNotFound`].
    pub async fn registration(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<Participant, GatewayError> {
        self.ensure_event(event_id).await?;
        self.require_participant(event_id, wallet).await
    }

    /// All participants with profile details.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] for unknown events.
    pub async fn participants(
        &self,
        event_id: EventId,
    ) -> Result<Vec<ParticipantWithProfile>, GatewayError> {
        self.ensure_event(event_id).await?;
        self.store.list_participants(event_id).await
    }

    /// Wallets that attended.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] for unknown events.
    pub async fn attended(&self, event_id: EventId) -> Result<Vec<WalletAddress>, GatewayError> {
        self.ensure_event(event_id).await?;
        self.store.attended_wallets(event_id).await
    }

    /// Marks the reward as claimed.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidRequest`] if the participant did not attend,
    /// [`GatewayError::Conflict`] if already claimed.
    pub async fn claim(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<Participant, GatewayError> {
        self.ensure_event(event_id).await?;
        let participant = self.require_participant(event_id, wallet).await?;
        participant.check_claimable().map_err(|refusal| match refusal {
            ClaimRefusal::NotAttended => GatewayError::InvalidRequest(refusal.to_string()),
            ClaimRefusal::AlreadyClaimed => GatewayError::conflict(refusal.to_string()),
        })?;
        if !self.store.mark_claimed(event_id, wallet).await? {
            return Err(GatewayError::conflict(
                ClaimRefusal::AlreadyClaimed.to_string(),
            ));
        }
        tracing::info!(%event_id, wallet = %wallet, "reward claimed");
        self.require_participant(event_id, wallet).await
    }

    async fn ensure_event(&self, event_id: EventId) -> Result<(), GatewayError> {
        self.store
            .find_event(event_id)
            .await?
            .map(|_| ())
            .ok_or(GatewayError::EventNotFound(event_id))
    }

    async fn require_participant(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
    ) -> Result<Participant, GatewayError> {
        self.store
            .find_participant(event_id, wallet)
            .await?
            .ok_or_else(|| GatewayError::ParticipantNotFound {
                event_id,
                wallet: wallet.to_string(),
            })
    }
}
