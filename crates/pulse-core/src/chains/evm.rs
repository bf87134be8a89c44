//! Ethereum-compatible chains (Ethereum, Base).

use serde_json::{json, Value};

use crate::{
    chains::{MetricKind, RpcCall, SubscriptionKind, METRIC_NAME},
    probe::{ChainSubscription, ProbeError},
    registry::MetricSpec,
    types::JsonRpcRequest,
};

/// Sender used for `eth_call` when the provider data does not name one.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

pub(crate) fn default_metrics() -> Vec<MetricSpec> {
    vec![
        MetricSpec::new(MetricKind::WsBlockLatency(SubscriptionKind::EvmNewHeads), METRIC_NAME),
        MetricSpec::new(MetricKind::EthCallLatency, METRIC_NAME),
        MetricSpec::new(
            MetricKind::HttpCallLatency(RpcCall::new("eth_blockNumber", None)),
            METRIC_NAME,
        ),
        MetricSpec::new(
            MetricKind::HttpCallLatency(RpcCall::new("eth_gasPrice", None)),
            METRIC_NAME,
        ),
    ]
}

/// `eth_subscribe ["newHeads"]`. EVM nodes drop the subscription with the
/// connection, so there is no explicit unsubscribe.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewHeadsSubscription;

impl ChainSubscription for NewHeadsSubscription {
    fn api_method(&self) -> &'static str {
        "eth_subscribe"
    }

    fn subscribe_request(&self) -> JsonRpcRequest {
        JsonRpcRequest::new("eth_subscribe", Some(json!(["newHeads"])))
    }

    fn block_key<'a>(&self, block: &'a Value) -> Option<&'a str> {
        block.get("hash").and_then(Value::as_str)
    }

    fn block_timestamp(&self, block: &Value) -> Result<i64, ProbeError> {
        let raw = block
            .get("timestamp")
            .and_then(Value::as_str)
            .ok_or_else(|| ProbeError::InvalidResponse("block timestamp missing".to_string()))?;
        parse_hex_i64(raw)
            .ok_or_else(|| ProbeError::InvalidResponse(format!("invalid block timestamp: {raw}")))
    }
}

fn parse_hex_i64(value: &str) -> Option<i64> {
    let digits = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X"))?;
    i64::from_str_radix(digits, 16).ok()
}

fn is_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Builds the `eth_call` request from a provider's `tx_data`
/// (`{"to": ..., "data": ..., "from"?: ...}`).
///
/// # Errors
///
/// Returns a description of the problem when `tx_data` is missing a field or
/// `to`/`from` is not a 20-byte hex address.
pub fn eth_call_request(tx_data: Option<&Value>) -> Result<JsonRpcRequest, String> {
    let tx_data = tx_data.ok_or("transaction data 'tx_data' is missing")?;

    let field = |name: &str| tx_data.get(name).and_then(Value::as_str);
    let to = field("to").ok_or("tx_data.to is missing")?;
    let data = field("data").ok_or("tx_data.data is missing")?;
    let from = field("from").unwrap_or(ZERO_ADDRESS);

    if !is_address(to) {
        return Err(format!("tx_data.to is not a valid address: {to}"));
    }
    if !is_address(from) {
        return Err(format!("tx_data.from is not a valid address: {from}"));
    }

    Ok(JsonRpcRequest::new(
        "eth_call",
        Some(json!([{ "from": from, "to": to, "data": data }, "latest"])),
    ))
}
