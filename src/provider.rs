//! JSON-RPC ledger transport
//!
//! The core talks to the chain through the `Provider` trait so hosts and
//! tests can inject their own transport; `HttpProvider` is the stock
//! implementation over a JSON-RPC endpoint.

use crate::error::{ErrorCode, SafeError, SafeResult};
use async_trait::async_trait;
use ethers_core::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters of an `eth_call` / `eth_estimateGas` style request
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
}

/// Ledger read/write transport
///
/// Every method is a suspension point; implementations must not retry
/// internally.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Execute a read-only call and return the raw return buffer
    async fn call(&self, request: &CallRequest) -> SafeResult<Bytes>;

    /// Ask the node for a gas estimate of the given call
    async fn estimate_gas(&self, request: &CallRequest) -> SafeResult<U256>;

    /// Native balance of an address
    async fn balance_of(&self, address: Address) -> SafeResult<U256>;

    /// Current node gas price
    async fn gas_price(&self) -> SafeResult<U256>;

    /// Pending-inclusive transaction count (account nonce)
    async fn transaction_count(&self, address: Address) -> SafeResult<U256>;

    /// Broadcast a signed raw transaction, returning its hash
    async fn send_raw_transaction(&self, raw: Bytes) -> SafeResult<H256>;
}

/// RPC request structure
#[derive(Debug, Serialize)]
struct RpcRequest<T: Serialize> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u64,
}

/// RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: Option<String>,
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[allow(dead_code)]
    data: Option<serde_json::Value>,
}

/// JSON-RPC provider over HTTP
pub struct HttpProvider {
    url: String,
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>) -> SafeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SafeError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { url: url.into(), client })
    }

    async fn request<T: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &'static str,
        params: T,
    ) -> SafeResult<R> {
        let request = RpcRequest { jsonrpc: "2.0", method, params, id: 1 };

        let response = self.client.post(&self.url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(SafeError::network(format!(
                "Node returned {}",
                response.status()
            )));
        }

        let envelope: RpcResponse<R> = response
            .json()
            .await
            .map_err(|e| SafeError::new(ErrorCode::ParseError, format!("Invalid response: {}", e)))?;

        match envelope.result {
            Some(result) => Ok(result),
            None => {
                let error = envelope
                    .error
                    .map(|e| format!("{}: {}", e.code, e.message))
                    .unwrap_or_else(|| "Empty RPC response".to_string());
                // Node-level rejections carry the revert reason verbatim.
                Err(SafeError::execution_failed(error))
            }
        }
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn call(&self, request: &CallRequest) -> SafeResult<Bytes> {
        self.request("eth_call", (request, "latest")).await
    }

    async fn estimate_gas(&self, request: &CallRequest) -> SafeResult<U256> {
        self.request("eth_estimateGas", (request,)).await
    }

    async fn balance_of(&self, address: Address) -> SafeResult<U256> {
        self.request("eth_getBalance", (address, "latest")).await
    }

    async fn gas_price(&self) -> SafeResult<U256> {
        self.request("eth_gasPrice", Vec::<String>::new()).await
    }

    async fn transaction_count(&self, address: Address) -> SafeResult<U256> {
        self.request("eth_getTransactionCount", (address, "pending")).await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> SafeResult<H256> {
        self.request("eth_sendRawTransaction", (raw,)).await
    }
}
