//! Read-only access to the ERC-20 token and event vault contracts.
//!
//! Everything goes through [`ChainReader`] so services can be exercised
//! without a node. The production implementation is
//! [`JsonRpcChainClient`], which issues `eth_call` over HTTP.

pub mod abi;
pub mod rpc_client;

use async_trait::async_trait;
use primitive_types::U256;

use crate::domain::WalletAddress;

pub use rpc_client::JsonRpcChainClient;

/// Failures talking to the Ethereum node.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// HTTP transport failed or timed out.
    #[error("rpc transport: {0}")]
    Transport(String),
    /// Node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Node-supplied message.
        message: String,
    },
    /// Response had neither `result` nor `error`.
    #[error("rpc response missing result")]
    MissingResult,
    /// Returned data could not be ABI-decoded.
    #[error("undecodable return data: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Contract views the gateway depends on.
#[async_trait]
pub trait ChainReader: Send + Sync + std::fmt::Debug {
    /// `balanceOf(owner)` on the configured token contract, in base units.
    async fn token_balance(&self, owner: &WalletAddress) -> Result<U256, ChainError>;

    /// `getParticipantCount()` on an event vault.
    async fn participant_count(&self, vault: &WalletAddress) -> Result<U256, ChainError>;

    /// Decimals used to format token balances.
    fn token_decimals(&self) -> u8;
}
