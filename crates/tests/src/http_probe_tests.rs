//! Tests for HTTP round-trip probes and the metric lifecycle around them.

use pulse_core::{
    chains::{Blockchain, MetricKind, RpcCall, METRIC_NAME},
    labels::{LabelKey, MetricLabels, STATUS_FAILED, STATUS_SUCCESS},
    metric::{Metric, MetricConfig},
    probe::{HttpProbe, Probe, ProbeError},
    registry::ProbeContext,
    types::JsonRpcRequest,
};
use serde_json::json;
use std::{sync::Arc, time::Duration};

use crate::mock_infrastructure::{fast_metric_config, http_client, DelayedRpcServer, RpcMockBuilder};

fn http_metric(url: &str, method: &str, config: MetricConfig) -> Metric {
    let request = JsonRpcRequest::new(method, None);
    let probe = HttpProbe::new(http_client(), Some(url.to_string()), request);
    Metric::new(
        METRIC_NAME,
        MetricLabels::new("fra1", "us-east", "Ethereum", "mock"),
        Arc::new(config),
        Box::new(probe),
    )
}

fn status(metric: &Metric) -> Option<&str> {
    metric.labels().get_label(LabelKey::ResponseStatus)
}

/// Round trip of a delayed server is at least the delay
#[tokio::test]
async fn test_latency_includes_server_delay() {
    let server = DelayedRpcServer::start(Duration::from_millis(50), json!("0x10")).await.unwrap();

    let mut metric = http_metric(&server.url(), "eth_blockNumber", fast_metric_config());
    metric.collect().await;

    let value = metric.latest_value().unwrap();
    assert!((0.05..1.0).contains(&value), "latency {value}");
    assert_eq!(status(&metric), Some(STATUS_SUCCESS));
    assert_eq!(server.hits(), 1);
}

/// A measurement above the ceiling is recorded as a failure
#[tokio::test]
async fn test_latency_above_ceiling_is_failure() {
    let server = DelayedRpcServer::start(Duration::from_millis(60), json!("0x10")).await.unwrap();
    let config =
        MetricConfig { timeout: Duration::from_secs(2), max_latency: Duration::from_millis(10) };

    let mut metric = http_metric(&server.url(), "eth_blockNumber", config);
    metric.collect().await;

    assert_eq!(metric.latest_value(), None);
    assert_eq!(status(&metric), Some(STATUS_FAILED));
    assert!(metric.influx_line().is_err());
}

/// Exceeding the request timeout is a timeout failure
#[tokio::test]
async fn test_slow_server_times_out() {
    let server = DelayedRpcServer::start(Duration::from_millis(500), json!("0x10")).await.unwrap();
    let mut probe = HttpProbe::new(
        http_client(),
        Some(server.url()),
        JsonRpcRequest::new("eth_blockNumber", None),
    );
    let config =
        MetricConfig { timeout: Duration::from_millis(100), max_latency: Duration::from_secs(30) };

    let err = probe.run_once(&config).await.unwrap_err();
    assert!(err.is_timeout(), "got {err:?}");
}

/// Non-200 responses fail without a value
#[tokio::test]
async fn test_server_error_status_is_failure() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_body("getSlot", 503, "unavailable");

    let mut metric = http_metric(&rpc.url(), "getSlot", fast_metric_config());
    metric.collect().await;

    assert!(metric.is_failed());
    assert_eq!(metric.latest_value(), None);
    rpc.assert_all().await;
}

/// A JSON-RPC error body is still a measured round trip for plain calls
#[tokio::test]
async fn test_plain_call_accepts_error_body() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_error("getSlot", -32005, "node is behind");

    let mut metric = http_metric(&rpc.url(), "getSlot", fast_metric_config());
    metric.collect().await;

    assert!(metric.latest_value().is_some());
}

/// A second collect on a reported metric does not hit the provider again
#[tokio::test]
async fn test_collect_is_skipped_once_reported() {
    let server = DelayedRpcServer::start(Duration::from_millis(1), json!(1)).await.unwrap();

    let mut metric = http_metric(&server.url(), "getSlot", fast_metric_config());
    metric.collect().await;
    let first = metric.latest_value();
    metric.collect().await;

    assert_eq!(metric.latest_value(), first);
    assert_eq!(server.hits(), 1);
}

fn eth_call_context(url: &str) -> ProbeContext {
    ProbeContext {
        provider: Some("mock".to_string()),
        http_endpoint: Some(url.to_string()),
        tx_data: Some(json!({
            "to": "0x00000000219ab540356cBB839Cbe05303d7705Fa",
            "data": "0x70a08231"
        })),
        ..ProbeContext::default()
    }
}

/// `eth_call` succeeds only with a non-null result
#[tokio::test]
async fn test_eth_call_requires_result() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_eth_call("0x0000000000000000000000000000000000000000000000000000000000000001");

    let mut probe =
        MetricKind::EthCallLatency.build(&eth_call_context(&rpc.url()), &http_client()).unwrap();
    assert_eq!(probe.api_method(), "eth_call");
    assert!(probe.run_once(&fast_metric_config()).await.unwrap().is_some());

    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_error("eth_call", 3, "execution reverted");

    let mut probe =
        MetricKind::EthCallLatency.build(&eth_call_context(&rpc.url()), &http_client()).unwrap();
    let err = probe.run_once(&fast_metric_config()).await.unwrap_err();
    assert!(matches!(err, ProbeError::InvalidResponse(ref m) if m.contains("execution reverted")));
}

/// Missing HTTP endpoint fails the probe, not the factory
#[tokio::test]
async fn test_missing_http_endpoint() {
    let kind = MetricKind::HttpCallLatency(RpcCall::new("getSlot", None));
    let mut probe = kind.build(&ProbeContext::default(), &http_client()).unwrap();

    let err = probe.run_once(&fast_metric_config()).await.unwrap_err();
    assert!(matches!(err, ProbeError::MissingEndpoint("http")));
}

/// Labels carry the chain name and api method from the kind
#[tokio::test]
async fn test_registry_metric_labels() {
    let mut registry = pulse_core::registry::MetricRegistry::new();
    registry.register(
        Blockchain::Base,
        [pulse_core::registry::MetricSpec::new(
            MetricKind::HttpCallLatency(RpcCall::new("eth_gasPrice", None)),
            METRIC_NAME,
        )],
    );

    let metrics = registry
        .create(
            Blockchain::Base,
            &Arc::new(fast_metric_config()),
            &ProbeContext { provider: Some("p1".into()), ..ProbeContext::default() },
            &http_client(),
        )
        .unwrap();

    let labels = metrics[0].labels();
    assert_eq!(labels.get_label(LabelKey::Blockchain), Some("Base"));
    assert_eq!(labels.get_label(LabelKey::ApiMethod), Some("eth_gasPrice"));
    assert_eq!(labels.get_label(LabelKey::SourceRegion), Some("default"));
}
