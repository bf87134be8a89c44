//! Solana.

use serde_json::{json, Value};

use crate::{
    chains::{MetricKind, RpcCall, SubscriptionKind, METRIC_NAME},
    probe::{ChainSubscription, ProbeError},
    registry::MetricSpec,
    types::JsonRpcRequest,
};

/// Signed transfer used by the `simulateTransaction` probe. The simulation result
/// is irrelevant; only the round trip is measured.
pub const SIMULATE_TRANSACTION_PAYLOAD: &str = "AQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABAAEDArczbMia1tLmq7zz4DinMNN0pJ1JtLdqIJPUw3YrGCzYAMHBsgN27lcgB6H2WQvFgyZuJYHa46puOQo9yQ8CVQbd9uHXZaGT2cvhRs7reawctIXtX1s3kTqM9YV+/wCp20C7Wj2aiuk5TReAXo+VTVg8QTHjs0UjNMMKCvpzZ+ABAgEBARU=";

pub(crate) fn default_metrics() -> Vec<MetricSpec> {
    vec![
        MetricSpec::new(MetricKind::WsBlockLatency(SubscriptionKind::SolanaBlocks), METRIC_NAME),
        MetricSpec::new(
            MetricKind::HttpCallLatency(RpcCall::new("getLatestBlockhash", None)),
            METRIC_NAME,
        ),
        MetricSpec::new(MetricKind::HttpCallLatency(RpcCall::new("getSlot", None)), METRIC_NAME),
        MetricSpec::new(
            MetricKind::HttpCallLatency(RpcCall::new(
                "simulateTransaction",
                Some(json!([SIMULATE_TRANSACTION_PAYLOAD, {"encoding": "base64"}])),
            )),
            METRIC_NAME,
        ),
    ]
}

/// `blockSubscribe` at `confirmed` commitment.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockSubscription;

impl ChainSubscription for BlockSubscription {
    fn api_method(&self) -> &'static str {
        "blockSubscribe"
    }

    fn subscribe_request(&self) -> JsonRpcRequest {
        JsonRpcRequest::new(
            "blockSubscribe",
            Some(json!([{"commitment": "confirmed", "encoding": "jsonParsed"}])),
        )
    }

    fn unsubscribe_request(&self, subscription_id: &Value) -> Option<JsonRpcRequest> {
        Some(JsonRpcRequest::new("blockUnsubscribe", Some(json!([subscription_id]))))
    }

    /// Notifications wrap the block as `{context, value: {slot, block}}`; flat
    /// payloads are accepted as-is.
    fn block<'a>(&self, result: &'a Value) -> &'a Value {
        result.get("value").and_then(|v| v.get("block")).unwrap_or(result)
    }

    fn block_key<'a>(&self, block: &'a Value) -> Option<&'a str> {
        block.get("blockhash").and_then(Value::as_str).filter(|h| !h.is_empty())
    }

    fn block_timestamp(&self, block: &Value) -> Result<i64, ProbeError> {
        block
            .get("blockTime")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                ProbeError::InvalidResponse("block time missing in block data".to_string())
            })
    }
}
