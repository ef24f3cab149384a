//! Registration, claim and participant listing DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{non_blank, parse_wallet};
use crate::domain::{Participant, ParticipantWithProfile, WalletAddress};
use crate::error::GatewayError;

/// Request body for `POST /events/{id}/register`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Registering wallet.
    pub user_address: String,
    /// Deposit transaction hash.
    pub transaction_hash: String,
    /// Deposited amount, decimal string.
    pub deposit_amount: String,
}

/// Request body for `POST /events/{id}/claim`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ClaimRequest {
    /// Claiming wallet.
    pub user_address: String,
}

/// `?user=` query used by registration lookups and withdrawals.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// Participant wallet.
    #[serde(default)]
    pub user: Option<String>,
}

/// Response wrapping one participant record.
#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Current participant state.
    pub participant: Participant,
}

/// `GET /events/{id}/participants` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantListResponse {
    /// Participants with profile details.
    pub participants: Vec<ParticipantWithProfile>,
    /// Number of participants.
    pub count: usize,
}

/// `GET /events/{id}/attended` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct AttendedResponse {
    /// Wallets marked attended.
    pub attended: Vec<WalletAddress>,
    /// Number of attendees.
    pub count: usize,
}

impl UserQuery {
    /// The `user` parameter, which is mandatory.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidRequest`] when missing, blank or not an address.
    pub fn wallet(&self) -> Result<WalletAddress, GatewayError> {
        let raw = non_blank(self.user.clone()).ok_or_else(|| {
            GatewayError::InvalidRequest("query parameter `user` is required".to_string())
        })?;
        parse_wallet("user", &raw)
    }
}
