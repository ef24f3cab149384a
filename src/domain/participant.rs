//! Registration of a profile for an event.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::address::{TxHash, WalletAddress};
use super::amount::TokenAmount;
use super::event_id::EventId;

/// One row of `participants`, joined with the owner's wallet.
///
/// A profile may join many events and an event has many participants;
/// the pair `(event_id, user_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Participant {
    /// Row identifier.
    pub id: Uuid,
    /// Event joined.
    pub event_id: EventId,
    /// Owning profile.
    pub user_id: Uuid,
    /// Owning wallet.
    pub wallet_address: WalletAddress,
    /// Check-in validated for this participant.
    pub is_attended: bool,
    /// Reward claimed.
    pub is_claimed: bool,
    /// Deposit transaction reported at registration.
    pub deposit_tx_hash: Option<TxHash>,
    /// Deposit amount reported at registration.
    pub deposit_amount: Option<TokenAmount>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Last attendance or claim change.
    pub updated_at: DateTime<Utc>,
}

/// Participant joined with profile details, for organizer listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ParticipantWithProfile {
    /// Participant record.
    #[serde(flatten)]
    pub participant: Participant,
    /// Profile display name.
    pub name: Option<String>,
    /// Profile email.
    pub email: Option<String>,
}

/// Data recorded when a wallet registers for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    /// Event being joined.
    pub event_id: EventId,
    /// Registering profile.
    pub user_id: Uuid,
    /// Deposit transaction.
    pub deposit_tx_hash: TxHash,
    /// Deposit amount.
    pub deposit_amount: TokenAmount,
}

/// Why a participant cannot claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClaimRefusal {
    /// No validated check-in.
    #[error("participant must check in before claiming rewards")]
    NotAttended,
    /// Reward already claimed.
    #[error("reward has already been claimed for this event")]
    AlreadyClaimed,
}

impl Participant {
    /// Checks the claim preconditions.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimRefusal`] if the participant did not attend or
    /// already claimed.
    pub const fn check_claimable(&self) -> Result<(), ClaimRefusal> {
        if !self.is_attended {
            return Err(ClaimRefusal::NotAttended);
        }
        if self.is_claimed {
            return Err(ClaimRefusal::AlreadyClaimed);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn participant(is_attended: bool, is_claimed: bool) -> Participant {
        let Ok(wallet) = WalletAddress::parse("0x3333333333333333333333333333333333333333") else {
            panic!("valid address");
        };
        Participant {
            id: Uuid::new_v4(),
            event_id: EventId::new(1),
            user_id: Uuid::new_v4(),
            wallet_address: wallet,
            is_attended,
            is_claimed,
            deposit_tx_hash: None,
            deposit_amount: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn claim_requires_attendance() {
        assert_eq!(
            participant(false, false).check_claimable(),
            Err(ClaimRefusal::NotAttended)
        );
    }

    #[test]
    fn claim_only_once() {
        assert_eq!(
            participant(true, true).check_claimable(),
            Err(ClaimRefusal::AlreadyClaimed)
        );
        assert!(participant(true, false).check_claimable().is_ok());
    }

    #[test]
    fn profile_fields_flatten() {
        let row = ParticipantWithProfile {
            participant: participant(true, false),
            name: Some("ana".to_string()),
            email: None,
        };
        let json = serde_json::to_value(&row).unwrap_or_default();
        assert_eq!(json["is_attended"], serde_json::json!(true));
        assert_eq!(json["name"], serde_json::json!("ana"));
    }
}
