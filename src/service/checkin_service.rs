//! Check-in service: QR proofs of presence and organizer validation.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::checkin::generate_qr_data;
use crate::domain::{Checkin, CheckinReview, EventId, WalletAddress};
use crate::error::GatewayError;
use crate::persistence::Store;

/// Handles check-in submission and review.
///
/// A positive review marks the matching participant as attended. The two
/// writes are independent: a check-in from a wallet that never registered
/// is still recorded as validated.
#[derive(Debug, Clone)]
pub struct CheckinService {
    store: Arc<dyn Store>,
}

impl CheckinService {
    /// Creates a new `CheckinService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Records a check-in, generating QR data when none is supplied.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] for unknown events,
    /// [`GatewayError::Conflict`] if the wallet already checked in.
    pub async fn submit(
        &self,
        event_id: EventId,
        wallet: &WalletAddress,
        qr_data: Option<String>,
    ) -> Result<Checkin, GatewayError> {
        if self.store.find_event(event_id).await?.is_none() {
            return Err(GatewayError::EventNotFound(event_id));
        }
        let qr_data = qr_data
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| generate_qr_data(wallet, event_id));
        let checkin = self.store.create_checkin(event_id, wallet, &qr_data).await?;
        tracing::info!(%event_id, wallet = %wallet, checkin_id = %checkin.id, "check-in recorded");
        Ok(checkin)
    }

    /// Accepts or rejects a check-in on behalf of the event organizer.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::CheckinNotFound`] for unknown check-ins.
    /// - [`GatewayError::Forbidden`] if `validator` is not the organizer.
    /// - [`GatewayError::Conflict`] if the check-in was already validated.
    pub async fn validate(
        &self,
        checkin_id: Uuid,
        is_valid: bool,
        validator: &WalletAddress,
    ) -> Result<Checkin, GatewayError> {
        let checkin = self
            .store
            .find_checkin(checkin_id)
            .await?
            .ok_or(GatewayError::CheckinNotFound(checkin_id))?;
        let event_id = checkin.event_id;
        let event = self
            .store
            .find_event(event_id)
            .await?
            .ok_or(GatewayError::EventNotFound(event_id))?;

        if !event.onchain.organizer_address.matches(validator.as_str()) {
            return Err(GatewayError::Forbidden(
                "only the event organizer can validate check-ins".to_string(),
            ));
        }
        if checkin.is_validated {
            return Err(GatewayError::conflict("check-in already validated"));
        }

        let review = CheckinReview {
            is_valid,
            reviewer: validator.clone(),
            reviewed_at: Utc::now(),
        };
        let reviewed = self
            .store
            .review_checkin(checkin_id, &review)
            .await?
            .ok_or_else(|| GatewayError::conflict("check-in already validated"))?;
        tracing::info!(%event_id, %checkin_id, is_valid, "check-in reviewed");

        if is_valid {
            let wallet = &reviewed.wallet_address;
            match self.store.mark_attended(event_id, wallet).await {
                Ok(true) => tracing::info!(%event_id, wallet = %wallet, "attendance recorded"),
                Ok(false) => {
                    tracing::warn!(
                        %event_id,
                        wallet = %wallet,
                        "validated check-in has no registration"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        %event_id,
                        wallet = %wallet,
                        error = %e,
                        "attendance update failed"
                    );
                }
            }
        }
        Ok(reviewed)
    }

    /// All check-ins for an event, newest first.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EventNotFound`] for unknown events.
    pub async fn list(&self, event_id: EventId) -> Result<Vec<Checkin>, GatewayError> {
        if self.store.find_event(event_id).await?.is_none() {
            return Err(GatewayError::EventNotFound(event_id));
        }
        self.store.list_checkins(event_id).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::event_view::fixtures::onchain;
    use crate::domain::{NewRegistration, ProfilePatch, TokenAmount, TxHash};
    use crate::persistence::{EventStore, MemoryStore, ParticipantStore, ProfileStore};

    fn wallet(n: u8) -> WalletAddress {
        let Ok(w) = WalletAddress::parse(&format!("0x{}", format!("{n:02x}").repeat(20))) else {
            panic!("valid wallet");
        };
        w
    }

    fn organizer() -> WalletAddress {
        wallet(0x22)
    }

    async fn setup() -> (CheckinService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let _ = store
            .ingest_event(&onchain(1, 1_700_000_000, 1_700_003_600))
            .await;
        (
            CheckinService::new(Arc::clone(&store) as Arc<dyn Store>),
            store,
        )
    }

    async fn register(store: &MemoryStore, n: u8) {
        let Ok(profile) = store.upsert_profile(&wallet(n), &ProfilePatch::default()).await else {
            panic!("profile");
        };
        let (Ok(tx), Ok(amount)) = (
            TxHash::parse(&format!("0x{}", format!("{n:02x}").repeat(32))),
            TokenAmount::parse_integer("5000000"),
        ) else {
            panic!("valid registration");
        };
        let reg = NewRegistration {
            event_id: EventId::new(1),
            user_id: profile.id,
            deposit_tx_hash: tx,
            deposit_amount: amount,
        };
        let Ok(_) = store.register_participant(&reg, 10).await else {
            panic!("register");
        };
    }

    #[tokio::test]
    async fn submit_generates_qr_and_rejects_duplicates() {
        let (svc, _) = setup().await;
        let Ok(checkin) = svc.submit(EventId::new(1), &wallet(0xa1), None).await else {
            panic!("submit");
        };
        assert!(checkin.qr_data.starts_with(wallet(0xa1).as_str()));
        assert!(!checkin.is_validated);

        assert!(matches!(
            svc.submit(EventId::new(1), &wallet(0xa1), Some("qr".to_string())).await,
            Err(GatewayError::Conflict(_))
        ));
        assert!(matches!(
            svc.submit(EventId::new(9), &wallet(0xa1), None).await,
            Err(GatewayError::EventNotFound(_))
        ));
    }

    #[tokio::test]
    async fn valid_review_marks_attendance() {
        let (svc, store) = setup().await;
        register(&store, 0xa1).await;
        let Ok(checkin) = svc.submit(EventId::new(1), &wallet(0xa1), None).await else {
            panic!("submit");
        };

        let Ok(reviewed) = svc.validate(checkin.id, true, &organizer()).await else {
            panic!("validate");
        };
        assert!(reviewed.is_validated);
        assert_eq!(reviewed.validated_by, Some(organizer()));

        let Ok(Some(p)) = store.find_participant(EventId::new(1), &wallet(0xa1)).await else {
            panic!("participant");
        };
        assert!(p.is_attended);
    }

    #[tokio::test]
    async fn unregistered_wallet_is_still_validated() {
        let (svc, _) = setup().await;
        let Ok(checkin) = svc.submit(EventId::new(1), &wallet(0xb2), None).await else {
            panic!("submit");
        };
        let result = svc.validate(checkin.id, true, &organizer()).await;
        assert!(matches!(result, Ok(ref c) if c.is_validated));
    }

    #[tokio::test]
    async fn rejected_checkin_can_be_accepted_once() {
        let (svc, _) = setup().await;
        let Ok(checkin) = svc.submit(EventId::new(1), &wallet(0xa1), None).await else {
            panic!("submit");
        };
        assert!(matches!(
            svc.validate(checkin.id, true, &wallet(0xa1)).await,
            Err(GatewayError::Forbidden(_))
        ));
        let rejected = svc.validate(checkin.id, false, &organizer()).await;
        assert!(matches!(rejected, Ok(ref c) if !c.is_validated));
        assert!(svc.validate(checkin.id, true, &organizer()).await.is_ok());
        assert!(matches!(
            svc.validate(checkin.id, true, &organizer()).await,
            Err(GatewayError::Conflict(_))
        ));
        assert!(matches!(
            svc.validate(Uuid::new_v4(), true, &organizer()).await,
            Err(GatewayError::CheckinNotFound(_))
        ));
    }
}
