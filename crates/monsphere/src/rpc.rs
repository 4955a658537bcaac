//! # HTTP JSON-RPC Provider
//!
//! A read-only [`Eip1193Provider`] over a plain node endpoint, for running
//! the views without a browser wallet.
//!
//! ```text
//!   view ──▶ Contracts ──▶ HttpProvider ──POST {jsonrpc,id,method,params}──▶ node
//! ```
//!
//! It holds no keys: account prompts, chain management and transactions are
//! refused with code 4200, and `eth_accounts` is always empty. It never
//! pushes notifications.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use monsphere_chain::provider::methods;
use monsphere_chain::{Eip1193Provider, ProviderError, WalletNotification};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;

/// Methods only a wallet can answer.
const WALLET_ONLY: [&str; 4] = [
    methods::REQUEST_ACCOUNTS,
    methods::SWITCH_CHAIN,
    methods::ADD_CHAIN,
    methods::SEND_TRANSACTION,
];

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ProviderError>,
}

impl RpcResponse {
    fn into_result(self) -> Result<Value, ProviderError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Read-only provider over an HTTP JSON-RPC endpoint.
pub struct HttpProvider {
    client: HttpClient,
    endpoint: String,
    next_id: AtomicU64,
    notifications: broadcast::Sender<WalletNotification>,
}

impl HttpProvider {
    /// Creates a provider for `endpoint`.
    #[must_use]
    pub fn new(endpoint: &str) -> Self {
        let (notifications, _) = broadcast::channel(1);
        Self {
            client: HttpClient::default(),
            endpoint: endpoint.to_string(),
            next_id: AtomicU64::new(1),
            notifications,
        }
    }

    /// Endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Answers what can be answered without the node.
    fn answer_locally(method: &str) -> Option<Result<Value, ProviderError>> {
        if method == methods::ACCOUNTS {
            return Some(Ok(json!([])));
        }
        if WALLET_ONLY.contains(&method) {
            return Some(Err(ProviderError::new(
                ProviderError::UNSUPPORTED_METHOD,
                format!("{method} needs a wallet; this endpoint is read-only"),
            )));
        }
        None
    }

    async fn post(&self, request: &RpcRequest<'_>) -> Result<RpcResponse, ProviderError> {
        let response = self
            .client
            .post(self.endpoint.as_str())
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|err| ProviderError::new(ProviderError::DISCONNECTED, err.to_string()))?
            .error_for_status()
            .map_err(|err| ProviderError::new(ProviderError::DISCONNECTED, err.to_string()))?;

        response
            .json::<RpcResponse>()
            .await
            .map_err(|err| ProviderError::invalid_response(request.method, err))
    }
}

#[async_trait]
impl Eip1193Provider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        if let Some(answer) = Self::answer_locally(method) {
            return answer;
        }
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        tracing::trace!(id = request.id, method, "rpc request");
        self.post(&request).await?.into_result()
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletNotification> {
        self.notifications.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wallet_methods_refused_without_network() {
        let provider = HttpProvider::new("http://127.0.0.1:9");

        let err = provider
            .request(methods::SEND_TRANSACTION, json!([]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ProviderError::UNSUPPORTED_METHOD);

        let accounts = provider.request(methods::ACCOUNTS, json!([])).await.unwrap();
        assert_eq!(accounts, json!([]));
    }

    #[test]
    fn test_response_shapes() {
        let ok: RpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "result": "0x279f"})).unwrap();
        assert_eq!(ok.into_result().unwrap(), json!("0x279f"));

        let pending: RpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 2, "result": null})).unwrap();
        assert_eq!(pending.into_result().unwrap(), Value::Null);

        let failed: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "error": {"code": -32000, "message": "execution reverted"}
        }))
        .unwrap();
        assert_eq!(
            failed.into_result().unwrap_err(),
            ProviderError::new(-32_000, "execution reverted")
        );
    }

    #[test]
    fn test_request_body() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: methods::CHAIN_ID,
            params: json!([]),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"jsonrpc": "2.0", "id": 7, "method": "eth_chainId", "params": []})
        );
    }

    #[test]
    fn test_never_notifies() {
        let provider = HttpProvider::new("http://127.0.0.1:9");
        let mut receiver = provider.subscribe();
        assert!(receiver.try_recv().is_err());
    }
}
