//! JSON-RPC wire types for the ledger node.

use serde::{Deserialize, Serialize};

/// JSON-RPC request structure
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<T> {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: T,
    pub id: u64,
}

impl<T> JsonRpcRequest<T> {
    pub fn new(method: impl Into<String>, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC response structure
///
/// `result` is `None` both when absent and when `null`.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    /// Node-specific detail, e.g. preflight logs.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}


/// Value wrapped with the slot it was read at.
#[derive(Debug, Deserialize)]
pub struct RpcResponseContext<T> {
    pub value: T,
}

/// One entry of `getSignatureStatuses`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    /// Slot the transaction landed in.
    pub slot: u64,
    /// `None` once the block is rooted.
    #[serde(default)]
    pub confirmations: Option<u64>,
    /// Execution error, `null` on success.
    #[serde(default)]
    pub err: Option<serde_json::Value>,
    /// processed, confirmed or finalized.
    #[serde(default)]
    pub confirmation_status: Option<String>,
}

/// `getTransaction` result.
#[derive(Debug, Deserialize)]
pub struct TransactionResult {
    /// Slot the transaction landed in.
    pub slot: u64,
    /// Execution metadata.
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
}

/// Execution metadata inside `getTransaction`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    /// Execution error, `null` on success.
    #[serde(default)]
    pub err: Option<serde_json::Value>,
    /// Program log lines.
    #[serde(default)]
    pub log_messages: Option<Vec<String>>,
}
