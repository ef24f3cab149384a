//! Profile DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Profile, ProfilePatch};

/// Request body for `POST /profiles` and `POST /profiles/upsert`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfileRequest {
    /// Owner wallet.
    pub wallet_address: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
}

impl ProfileRequest {
    /// Fields to write.
    #[must_use]
    pub fn patch(&self) -> ProfilePatch {
        ProfilePatch::from_optional(self.name.clone(), self.email.clone())
    }
}

/// Request body for `PUT /profiles/{wallet}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New email.
    #[serde(default)]
    pub email: Option<String>,
}

impl UpdateProfileRequest {
    /// Fields to write; missing or blank ones are left unchanged.
    #[must_use]
    pub fn patch(&self) -> ProfilePatch {
        ProfilePatch::from_optional(self.name.clone(), self.email.clone())
    }
}

/// `GET /profiles/{wallet}` response: the profile plus its live balance.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileWithBalance {
    /// Stored profile.
    #[serde(flatten)]
    pub profile: Profile,
    /// Token balance in display units.
    pub balance: String,
}
