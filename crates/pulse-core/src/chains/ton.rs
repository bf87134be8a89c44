//! TON. HTTP probes only; TON providers expose no block subscription.

use serde_json::json;

use crate::{
    chains::{MetricKind, RpcCall, METRIC_NAME},
    registry::MetricSpec,
};

const BLOCK_HEADER_SEQNO: u64 = 39_064_874;
const WALLET_MASTER_ADDRESS: &str = "EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs";
const OWNER_SLICE: &str = "te6cckEBAQEAJAAAQ4AbUzrTQYTUv8s/I9ds2TSZgRjyrgl2S2LKcZMEFcxj6PARy3rF";

pub(crate) fn default_metrics() -> Vec<MetricSpec> {
    vec![
        MetricSpec::new(
            MetricKind::HttpCallLatency(RpcCall::new("getConsensusBlock", None)),
            METRIC_NAME,
        ),
        MetricSpec::new(
            MetricKind::HttpCallLatency(RpcCall::new(
                "getBlockHeader",
                Some(json!({
                    "workchain": -1,
                    "shard": "-9223372036854775808",
                    "seqno": BLOCK_HEADER_SEQNO,
                })),
            )),
            METRIC_NAME,
        ),
        MetricSpec::new(
            MetricKind::HttpCallLatency(RpcCall::new(
                "runGetMethod",
                Some(json!({
                    "address": WALLET_MASTER_ADDRESS,
                    "method": "get_wallet_address",
                    "stack": [["tvm.Slice", OWNER_SLICE]],
                })),
            )),
            METRIC_NAME,
        ),
    ]
}
