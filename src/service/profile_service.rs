//! Profile service: wallet-keyed profiles plus the live token balance.

use std::sync::Arc;

use crate::chain::ChainReader;
use crate::chain::abi::format_units;
use crate::domain::{Profile, ProfilePatch, WalletAddress};
use crate::error::GatewayError;
use crate::persistence::Store;

/// Profile operations. Balances are read from the token contract on every
/// request and never stored.
#[derive(Debug, Clone)]
pub struct ProfileService {
    store: Arc<dyn Store>,
    chain: Arc<dyn ChainReader>,
}

impl ProfileService {
    /// Creates a new `ProfileService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, chain: Arc<dyn ChainReader>) -> Self {
        Self { store, chain }
    }

    /// Creates a profile.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Conflict`] if the wallet already has one.
    pub async fn create(
        &self,
        wallet: &WalletAddress,
        patch: &ProfilePatch,
    ) -> Result<Profile, GatewayError> {
        let profile = self.store.create_profile(wallet, patch).await?;
        tracing::info!(wallet = %wallet, "profile created");
        Ok(profile)
    }

    /// Profile with its formatted token balance.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ProfileNotFound`] if the wallet has no profile.
    pub async fn get_with_balance(
        &self,
        wallet: &WalletAddress,
    ) -> Result<(Profile, String), GatewayError> {
        let profile = self
            .store
            .find_profile(wallet)
            .await?
            .ok_or_else(|| GatewayError::ProfileNotFound(wallet.to_string()))?;
        let balance = self.balance_of(wallet).await;
        Ok((profile, balance))
    }

    /// Partially updates an existing profile.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ProfileNotFound`] if the wallet has no profile.
    pub async fn update(
        &self,
        wallet: &WalletAddress,
        patch: &ProfilePatch,
    ) -> Result<Profile, GatewayError> {
        self.store
            .update_profile(wallet, patch)
            .await?
            .ok_or_else(|| GatewayError::ProfileNotFound(wallet.to_string()))
    }

    /// Updates the profile if present, otherwise creates it.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on storage failure.
    pub async fn upsert(
        &self,
        wallet: &WalletAddress,
        patch: &ProfilePatch,
    ) -> Result<Profile, GatewayError> {
        self.store.upsert_profile(wallet, patch).await
    }

    /// Token balance in display units; `"0"` when the contract read fails.
    pub async fn balance_of(&self, wallet: &WalletAddress) -> String {
        match self.chain.token_balance(wallet).await {
            Ok(raw) => format_units(raw, self.chain.token_decimals()),
            Err(e) => {
                tracing::warn!(wallet = %wallet, error = %e, "balance lookup failed");
                "0".to_string()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::chain::stub::StubChain;
    use crate::persistence::MemoryStore;

    fn wallet() -> WalletAddress {
        let Ok(w) = WalletAddress::parse("0xAbCdEf0000000000000000000000000000000001") else {
            panic!("valid wallet");
        };
        w
    }

    fn service(chain: StubChain) -> ProfileService {
        ProfileService::new(Arc::new(MemoryStore::new()), Arc::new(chain))
    }

    #[tokio::test]
    async fn balance_is_formatted() {
        let svc = service(StubChain::healthy(12_345_678, 0));
        let Ok(_) = svc.create(&wallet(), &ProfilePatch::default()).await else {
            panic!("create");
        };
        let Ok((profile, balance)) = svc.get_with_balance(&wallet()).await else {
            panic!("profile exists");
        };
        assert_eq!(balance, "12.345678");
        assert_eq!(profile.wallet_address.as_str(), "0xabcdef0000000000000000000000000000000001");
    }

    #[tokio::test]
    async fn chain_failure_degrades_to_zero() {
        let svc = service(StubChain::failing());
        let _ = svc.create(&wallet(), &ProfilePatch::default()).await;
        let result = svc.get_with_balance(&wallet()).await;
        assert!(matches!(result, Ok((_, ref b)) if b == "0"));
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let svc = service(StubChain::healthy(0, 0));
        assert!(svc.create(&wallet(), &ProfilePatch::default()).await.is_ok());
        assert!(matches!(
            svc.create(&wallet(), &ProfilePatch::default()).await,
            Err(GatewayError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn update_missing_profile_is_not_found() {
        let svc = service(StubChain::healthy(0, 0));
        let patch = ProfilePatch::from_optional(Some("ana".to_string()), None);
        assert!(matches!(
            svc.update(&wallet(), &patch).await,
            Err(GatewayError::ProfileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn upsert_keeps_unset_fields() {
        let svc = service(StubChain::healthy(0, 0));
        let first =
            ProfilePatch::from_optional(Some("ana".to_string()), Some("a@x.io".to_string()));
        let _ = svc.upsert(&wallet(), &first).await;
        let second = ProfilePatch::from_optional(None, Some("ana@x.io".to_string()));
        let Ok(profile) = svc.upsert(&wallet(), &second).await else {
            panic!("upsert");
        };
        assert_eq!(profile.name.as_deref(), Some("ana"));
        assert_eq!(profile.email.as_deref(), Some("ana@x.io"));
    }
}
