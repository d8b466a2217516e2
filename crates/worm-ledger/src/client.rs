//! The [`LedgerApi`] trait and its JSON-RPC 2.0 HTTP implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use worm_core::Amount;

use crate::errors::LedgerError;

/// Which token a balance query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// The reward token.
    Worm,
    /// The commitment token.
    Beth,
}

impl TokenKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Worm => "worm",
            Self::Beth => "beth",
        }
    }
}

/// A submitted transaction, identified by its hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxHandle(pub String);

/// Everything the aggregation and participation paths need from the ledger.
///
/// One trait, one remote collaborator. Implementations do not retry.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// The in-progress epoch number.
    async fn current_epoch(&self) -> Result<u64, LedgerError>;

    /// Token balance of `address`.
    async fn balance_of(&self, token: TokenKind, address: &str) -> Result<Amount, LedgerError>;

    /// `address`'s commitment to `epoch`.
    async fn epoch_commitment(&self, epoch: u64, address: &str) -> Result<Amount, LedgerError>;

    /// Everyone's commitment to `epoch`.
    async fn epoch_total(&self, epoch: u64) -> Result<Amount, LedgerError>;

    /// Reward estimate for `count` epochs starting at `start_epoch`.
    ///
    /// Only defined when every scanned epoch has completed
    /// (`start_epoch + count - 1 < current_epoch`); the ledger rejects
    /// anything else and the error is surfaced as-is.
    async fn estimated_reward(
        &self,
        start_epoch: u64,
        count: u64,
        address: &str,
    ) -> Result<Amount, LedgerError>;

    /// Current spending allowance granted by `owner` to the scheme.
    async fn allowance(&self, owner: &str) -> Result<Amount, LedgerError>;

    /// Raise the spending allowance to `amount`.
    async fn approve(&self, amount: Amount) -> Result<TxHandle, LedgerError>;

    /// Commit `amount_per_epoch` to each of the next `num_epochs` epochs.
    async fn participate(
        &self,
        amount_per_epoch: Amount,
        num_epochs: u64,
    ) -> Result<TxHandle, LedgerError>;

    /// Claim rewards for `num_epochs` epochs starting at `start_epoch`.
    async fn claim(&self, start_epoch: u64, num_epochs: u64) -> Result<TxHandle, LedgerError>;

    /// Wait until `tx` reaches finality.
    async fn wait_for_receipt(&self, tx: &TxHandle) -> Result<(), LedgerError>;
}

/// JSON-RPC 2.0 client over HTTP POST.
pub struct HttpLedgerClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcReply {
    result: Option<Value>,
    error: Option<RpcReplyError>,
}

#[derive(Deserialize)]
struct RpcReplyError {
    code: i64,
    message: String,
}

impl HttpLedgerClient {
    /// Build a client for `url` with a per-request `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// One JSON-RPC call. No retries.
    #[instrument(skip(self, params), fields(url = %self.url))]
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "ledger call");
        let reply: RpcReply = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = reply.error {
            return Err(LedgerError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        let result = reply.result.ok_or_else(|| LedgerError::Decode {
            message: format!("{method}: reply carried neither result nor error"),
        })?;
        serde_json::from_value(result).map_err(|e| LedgerError::Decode {
            message: format!("{method}: {e}"),
        })
    }

    /// Call a method whose result is a base-unit amount string.
    async fn call_amount(&self, method: &str, params: Value) -> Result<Amount, LedgerError> {
        let raw: String = self.call(method, params).await?;
        Ok(Amount::from_base_str(&raw)?)
    }

    /// Call a method whose result is a transaction hash.
    async fn call_tx(&self, method: &str, params: Value) -> Result<TxHandle, LedgerError> {
        let hash: String = self.call(method, params).await?;
        Ok(TxHandle(hash))
    }
}

#[async_trait]
impl LedgerApi for HttpLedgerClient {
    async fn current_epoch(&self) -> Result<u64, LedgerError> {
        self.call("worm_currentEpoch", json!([])).await
    }

    async fn balance_of(&self, token: TokenKind, address: &str) -> Result<Amount, LedgerError> {
        self.call_amount("worm_balanceOf", json!([token.as_str(), address]))
            .await
    }

    async fn epoch_commitment(&self, epoch: u64, address: &str) -> Result<Amount, LedgerError> {
        self.call_amount("worm_epochUser", json!([epoch, address]))
            .await
    }

    async fn epoch_total(&self, epoch: u64) -> Result<Amount, LedgerError> {
        self.call_amount("worm_epochTotal", json!([epoch])).await
    }

    async fn estimated_reward(
        &self,
        start_epoch: u64,
        count: u64,
        address: &str,
    ) -> Result<Amount, LedgerError> {
        self.call_amount("worm_calculateMintAmount", json!([start_epoch, count, address]))
            .await
    }

    async fn allowance(&self, owner: &str) -> Result<Amount, LedgerError> {
        self.call_amount("beth_allowance", json!([owner])).await
    }

    async fn approve(&self, amount: Amount) -> Result<TxHandle, LedgerError> {
        self.call_tx("beth_approve", json!([amount.to_base_str()]))
            .await
    }

    async fn participate(
        &self,
        amount_per_epoch: Amount,
        num_epochs: u64,
    ) -> Result<TxHandle, LedgerError> {
        self.call_tx(
            "worm_participate",
            json!([amount_per_epoch.to_base_str(), num_epochs]),
        )
        .await
    }

    async fn claim(&self, start_epoch: u64, num_epochs: u64) -> Result<TxHandle, LedgerError> {
        self.call_tx("worm_claim", json!([start_epoch, num_epochs]))
            .await
    }

    async fn wait_for_receipt(&self, tx: &TxHandle) -> Result<(), LedgerError> {
        let _: Value = self.call("tx_waitForReceipt", json!([tx.0])).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HttpLedgerClient {
        HttpLedgerClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn rpc_result(value: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": value,
        }))
    }

    #[tokio::test]
    async fn current_epoch_decodes_number() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(json!({ "method": "worm_currentEpoch" })))
            .respond_with(rpc_result(json!(42)))
            .expect(1)
            .mount(&server)
            .await;

        let epoch = client(&server).current_epoch().await.unwrap();
        assert_eq!(epoch, 42);
    }

    #[tokio::test]
    async fn balance_of_parses_base_units() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(
                json!({ "method": "worm_balanceOf", "params": ["beth", "0xabc"] }),
            ))
            .respond_with(rpc_result(json!("1500000000000000000")))
            .mount(&server)
            .await;

        let balance = client(&server)
            .balance_of(TokenKind::Beth, "0xabc")
            .await
            .unwrap();
        assert_eq!(balance.to_string(), "1.5");
    }

    #[tokio::test]
    async fn rpc_error_surfaces_code_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32000, "message": "epoch not completed" },
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .estimated_reward(5, 2, "0xabc")
            .await
            .unwrap_err();
        assert_matches!(err, LedgerError::Rpc { code: -32000, ref message } if message == "epoch not completed");
    }

    #[tokio::test]
    async fn server_failure_is_not_retried() {
        let server = MockServer::start().await;
        // expect(1) fails the test if the client retries.
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).current_epoch().await.unwrap_err();
        assert_matches!(err, LedgerError::Transport(_));
    }

    #[tokio::test]
    async fn participate_sends_base_units_and_count() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "worm_participate",
                "params": ["1000000000000000000", 3],
            })))
            .respond_with(rpc_result(json!("0xdeadbeef")))
            .mount(&server)
            .await;

        let tx = client(&server)
            .participate("1".parse().unwrap(), 3)
            .await
            .unwrap();
        assert_eq!(tx, TxHandle("0xdeadbeef".into()));
    }

    #[tokio::test]
    async fn malformed_reply_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(rpc_result(json!("not a number")))
            .mount(&server)
            .await;

        let err = client(&server).current_epoch().await.unwrap_err();
        assert_matches!(err, LedgerError::Decode { .. });
    }
}
