//! JSON-RPC wire types shared by the HTTP and WebSocket probes.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// JSON-RPC protocol version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// Pre-allocated `Cow` for the JSON-RPC version.
pub const JSONRPC_VERSION_COW: Cow<'static, str> = Cow::Borrowed(JSONRPC_VERSION);

/// Request id used by every probe. Probes issue exactly one call per connection.
pub const PROBE_REQUEST_ID: u64 = 1;

/// JSON-RPC 2.0 request in the `{id, jsonrpc, method, params?}` layout.
///
/// `params` is omitted from the serialized body when absent.
///
/// # Example
///
/// ```
/// use pulse_core::types::JsonRpcRequest;
///
/// let request = JsonRpcRequest::new("eth_blockNumber", None);
/// assert_eq!(
///     serde_json::to_string(&request).unwrap(),
///     r#"{"id":1,"jsonrpc":"2.0","method":"eth_blockNumber"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub id: u64,
    pub jsonrpc: Cow<'static, str>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self { id: PROBE_REQUEST_ID, jsonrpc: JSONRPC_VERSION_COW, method: method.into(), params }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Loosely-typed JSON-RPC response. Providers disagree on the exact shape, so
/// every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Returns the result when it is present and not `null`.
    #[must_use]
    pub fn non_null_result(&self) -> Option<&serde_json::Value> {
        self.result.as_ref().filter(|r| !r.is_null())
    }
}
