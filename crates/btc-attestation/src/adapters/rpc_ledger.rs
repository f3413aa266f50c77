//! JSON-RPC ledger client.
//!
//! Implements `LedgerQuery` against a Solana-compatible node using
//! `getSignatureStatuses` and `getTransaction`. Broadcasting stays with the
//! external signer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, trace};

use super::rpc_types::{
    JsonRpcRequest, JsonRpcResponse, RpcResponseContext, SignatureStatus, TransactionResult,
};
use crate::config::AttestationConfig;
use crate::domain::{
    ExecutionRecord, FinalityTier, LedgerError, SubmissionHandle, TransactionStatus,
};
use crate::ports::LedgerQuery;

/// Ledger client over HTTP JSON-RPC.
pub struct RpcLedgerClient {
    client: Client,
    url: String,
    request_id: AtomicU64,
}

impl RpcLedgerClient {
    /// Create a client for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            request_id: AtomicU64::new(1),
        })
    }

    /// Create a client from the endpoint settings in `config`.
    pub fn from_config(config: &AttestationConfig) -> Result<Self, LedgerError> {
        Self::new(config.rpc_url.clone(), config.rpc_timeout)
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call a JSON-RPC method. `Ok(None)` for a `null` result.
    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<Option<R>, LedgerError> {
        let request = JsonRpcRequest::new(method, params, self.next_id());
        trace!(method, id = request.id, "Sending RPC request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LedgerError::Transport(format!("cannot connect to {}", self.url))
                } else {
                    LedgerError::Transport(e.to_string())
                }
            })?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| LedgerError::Malformed(e.to_string()))?;

        into_result(rpc_response)
    }

    /// Raw status entry for `handle`, searching full history.
    pub async fn signature_status(
        &self,
        handle: &SubmissionHandle,
    ) -> Result<Option<SignatureStatus>, LedgerError> {
        let params = json!([[handle.as_str()], { "searchTransactionHistory": true }]);
        let context: RpcResponseContext<Vec<Option<SignatureStatus>>> = self
            .call("getSignatureStatuses", params)
            .await?
            .ok_or_else(|| LedgerError::Malformed("missing getSignatureStatuses result".into()))?;

        Ok(context.value.into_iter().next().flatten())
    }

    /// Raw transaction for `handle` at `tier`.
    pub async fn transaction(
        &self,
        handle: &SubmissionHandle,
        tier: FinalityTier,
    ) -> Result<Option<TransactionResult>, LedgerError> {
        self.call("getTransaction", transaction_params(handle, tier))
            .await
    }
}

fn into_result<R>(response: JsonRpcResponse<R>) -> Result<Option<R>, LedgerError> {
    if let Some(error) = response.error {
        let message = match error.data.filter(|d| !d.is_null()) {
            Some(data) => format!("{} ({data})", error.message),
            None => error.message,
        };
        return Err(LedgerError::Rpc {
            code: error.code,
            message,
        });
    }
    Ok(response.result)
}

/// Commitment used for `getTransaction`, which serves nothing below
/// `confirmed`.
fn record_commitment(tier: FinalityTier) -> FinalityTier {
    tier.max(FinalityTier::Confirmed)
}

fn transaction_params(handle: &SubmissionHandle, tier: FinalityTier) -> serde_json::Value {
    json!([
        handle.as_str(),
        {
            "commitment": record_commitment(tier).as_str(),
            "encoding": "json",
            "maxSupportedTransactionVersion": 0,
        }
    ])
}

/// Map a status entry onto the port's status.
pub(crate) fn status_from_entry(entry: Option<SignatureStatus>) -> TransactionStatus {
    let Some(entry) = entry else {
        return TransactionStatus::Pending;
    };

    if let Some(err) = entry.err.filter(|e| !e.is_null()) {
        return TransactionStatus::Failed {
            slot: entry.slot,
            reason: err.to_string(),
        };
    }

    let tier = match entry.confirmation_status.as_deref() {
        Some(raw) => raw.parse().unwrap_or(FinalityTier::Processed),
        // Older nodes omit the field; rooted blocks report no confirmation count.
        None if entry.confirmations.is_none() => FinalityTier::Finalized,
        None => FinalityTier::Processed,
    };

    TransactionStatus::Landed {
        slot: entry.slot,
        tier,
    }
}

/// Map a `getTransaction` result onto an execution record.
pub(crate) fn record_from_result(result: TransactionResult) -> ExecutionRecord {
    let (error, log_messages) = match result.meta {
        Some(meta) => (
            meta.err.filter(|e| !e.is_null()).map(|e| e.to_string()),
            meta.log_messages,
        ),
        None => (None, None),
    };

    ExecutionRecord {
        slot: result.slot,
        error,
        log_messages,
    }
}

#[async_trait]
impl LedgerQuery for RpcLedgerClient {
    async fn transaction_status(
        &self,
        handle: &SubmissionHandle,
    ) -> Result<TransactionStatus, LedgerError> {
        let status = status_from_entry(self.signature_status(handle).await?);
        debug!(handle = %handle, ?status, "Fetched transaction status");
        Ok(status)
    }

    async fn execution_record(
        &self,
        handle: &SubmissionHandle,
        tier: FinalityTier,
    ) -> Result<Option<ExecutionRecord>, LedgerError> {
        Ok(self.transaction(handle, tier).await?.map(record_from_result))
    }
}
