//! `eth_call` over HTTP JSON-RPC.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use primitive_types::U256;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::abi;
use super::{ChainError, ChainReader};
use crate::domain::WalletAddress;

const BALANCE_OF: &str = "balanceOf(address)";
const GET_PARTICIPANT_COUNT: &str = "getParticipantCount()";

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: T,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
struct CallObject<'a> {
    to: &'a str,
    data: String,
}

/// [`ChainReader`] backed by a node's HTTP JSON-RPC endpoint.
#[derive(Debug)]
pub struct JsonRpcChainClient {
    http: reqwest::Client,
    rpc_url: String,
    token_contract: WalletAddress,
    token_decimals: u8,
    request_id: AtomicU64,
}

impl JsonRpcChainClient {
    /// Creates a client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        rpc_url: impl Into<String>,
        token_contract: WalletAddress,
        token_decimals: u8,
        timeout: Duration,
    ) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            rpc_url: rpc_url.into(),
            token_contract,
            token_decimals,
            request_id: AtomicU64::new(1),
        })
    }

    async fn call<P: Serialize + Send, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, ChainError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        let response: JsonRpcResponse<R> = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        response.result.ok_or(ChainError::MissingResult)
    }

    async fn eth_call_u256(
        &self,
        to: &WalletAddress,
        signature: &str,
        args: &[[u8; 32]],
    ) -> Result<U256, ChainError> {
        let call = CallObject {
            to: to.as_str(),
            data: abi::calldata(abi::selector(signature), args),
        };
        let raw: String = self.call("eth_call", (call, "latest")).await?;
        let value = abi::decode_u256(&raw)?;
        tracing::debug!(contract = %to, signature, %value, "eth_call");
        Ok(value)
    }
}

#[async_trait]
impl ChainReader for JsonRpcChainClient {
    async fn token_balance(&self, owner: &WalletAddress) -> Result<U256, ChainError> {
        let arg = abi::encode_address(owner.to_bytes());
        self.eth_call_u256(&self.token_contract, BALANCE_OF, &[arg]).await
    }

    async fn participant_count(&self, vault: &WalletAddress) -> Result<U256, ChainError> {
        self.eth_call_u256(vault, GET_PARTICIPANT_COUNT, &[]).await
    }

    fn token_decimals(&self) -> u8 {
        self.token_decimals
    }
}
