//! Wallet-keyed user profiles.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::address::WalletAddress;

/// One row of `profiles`. Token balance is never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Profile {
    /// Row identifier.
    pub id: Uuid,
    /// Unique wallet.
    pub wallet_address: WalletAddress,
    /// Display name.
    pub name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

/// Fields to set on a profile; `None` leaves the stored value as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    /// New display name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
}

impl ProfilePatch {
    /// Builds a patch, treating blank strings as "unchanged".
    #[must_use]
    pub fn from_optional(name: Option<String>, email: Option<String>) -> Self {
        Self {
            name: name.and_then(non_blank),
            email: email.and_then(non_blank),
        }
    }

    /// Applies the patch to an in-memory profile.
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(name) = &self.name {
            profile.name = Some(name.clone());
        }
        if let Some(email) = &self.email {
            profile.email = Some(email.clone());
        }
    }
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_ignored() {
        let patch = ProfilePatch::from_optional(Some("  ".to_string()), Some("a@b.c".to_string()));
        assert_eq!(patch.name, None);
        assert_eq!(patch.email.as_deref(), Some("a@b.c"));
    }
}
