//! QR-code attendance proofs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::address::WalletAddress;
use super::event_id::EventId;

/// One row of `checkins`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Checkin {
    /// Row identifier.
    pub id: Uuid,
    /// Event checked into.
    pub event_id: EventId,
    /// Wallet presenting the code.
    pub wallet_address: WalletAddress,
    /// Scanned QR payload.
    pub qr_data: String,
    /// Submission time.
    pub checked_in_at: DateTime<Utc>,
    /// Organizer accepted the proof.
    pub is_validated: bool,
    /// Last review time.
    pub validated_at: Option<DateTime<Utc>>,
    /// Reviewing organizer.
    pub validated_by: Option<WalletAddress>,
}

/// Organizer decision on a check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckinReview {
    /// Accept or reject.
    pub is_valid: bool,
    /// Reviewer wallet.
    pub reviewer: WalletAddress,
    /// Review time.
    pub reviewed_at: DateTime<Utc>,
}

/// Builds the QR payload `<wallet>:<event_id>:<16 hex chars>`.
#[must_use]
pub fn generate_qr_data(wallet: &WalletAddress, event_id: EventId) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    let suffix = nonce.get(..16).unwrap_or(&nonce);
    format!("{wallet}:{event_id}:{suffix}")
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn qr_data_has_three_parts() {
        let Ok(wallet) = WalletAddress::parse("0x4444444444444444444444444444444444444444") else {
            panic!("valid address");
        };
        let qr = generate_qr_data(&wallet, EventId::new(9));
        let parts: Vec<&str> = qr.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts.first().copied(), Some(wallet.as_str()));
        assert_eq!(parts.get(1).copied(), Some("9"));
        assert_eq!(parts.get(2).map(|s| s.len()), Some(16));
    }

    #[test]
    fn qr_data_is_unique() {
        let Ok(wallet) = WalletAddress::parse("0x4444444444444444444444444444444444444444") else {
            panic!("valid address");
        };
        assert_ne!(
            generate_qr_data(&wallet, EventId::new(1)),
            generate_qr_data(&wallet, EventId::new(1))
        );
    }
}
