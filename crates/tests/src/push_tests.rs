//! Tests for backend delivery and its retry schedule.

use pulse_core::push::{MetricsPusher, PushOutcome, SkipReason};
use std::time::{Duration, Instant};

use crate::mock_infrastructure::{http_client, push_settings, pusher, MockPushBackend};

const PAYLOAD: &str = "response_latency_seconds,blockchain=Ton,provider=p value=0.25";

/// Two failures then success is delivered on the third attempt
#[tokio::test]
async fn test_fail_twice_then_succeed() {
    let backend = MockPushBackend::start([500, 503, 204]).await.unwrap();

    let outcome = pusher(&backend.url(), 3).push(PAYLOAD).await;

    assert_eq!(outcome, PushOutcome::Delivered { attempts: 3 });
    assert_eq!(backend.attempts(), 3);
}

/// An always failing backend sees exactly `retries` attempts
#[tokio::test]
async fn test_always_failing_backend_gets_exactly_retries() {
    let backend = MockPushBackend::start([500]).await.unwrap();

    let outcome = pusher(&backend.url(), 4).push(PAYLOAD).await;

    assert_eq!(outcome, PushOutcome::Abandoned { attempts: 4 });
    assert_eq!(backend.attempts(), 4);
}

/// The fixed delay separates attempts but does not follow the last one
#[tokio::test]
async fn test_fixed_delay_between_attempts_only() {
    let backend = MockPushBackend::start([500]).await.unwrap();
    let mut settings = push_settings(&backend.url(), 3);
    settings.retry_delay = Duration::from_millis(400);

    let started = Instant::now();
    let outcome = MetricsPusher::new(settings, http_client()).push(PAYLOAD).await;
    let elapsed = started.elapsed();

    assert_eq!(outcome, PushOutcome::Abandoned { attempts: 3 });
    assert!(elapsed >= Duration::from_millis(800), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1150), "elapsed {elapsed:?}");
}

/// The body is the payload, sent as text with basic auth
#[tokio::test]
async fn test_push_request_shape() {
    let backend = MockPushBackend::accepting().await.unwrap();

    let outcome = pusher(&backend.url(), 3).push(PAYLOAD).await;
    assert!(outcome.is_delivered());

    let received = backend.received().await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].body, PAYLOAD);
    assert!(received[0].content_type.as_deref().unwrap_or_default().starts_with("text/plain"));
    // base64("123456:push-key")
    assert_eq!(received[0].authorization.as_deref(), Some("Basic MTIzNDU2OnB1c2gta2V5"));
}

/// `200 OK` counts as delivered as well as `204`
#[tokio::test]
async fn test_200_is_delivered() {
    let backend = MockPushBackend::start([200]).await.unwrap();
    let outcome = pusher(&backend.url(), 1).push(PAYLOAD).await;
    assert_eq!(outcome, PushOutcome::Delivered { attempts: 1 });
}

/// Nothing is sent for an empty payload
#[tokio::test]
async fn test_empty_payload_sends_nothing() {
    let backend = MockPushBackend::accepting().await.unwrap();

    let outcome = pusher(&backend.url(), 3).push("").await;

    assert_eq!(outcome, PushOutcome::Skipped(SkipReason::EmptyPayload));
    assert_eq!(backend.attempts(), 0);
}

/// Missing credentials skip delivery without contacting the backend
#[tokio::test]
async fn test_missing_user_skips_delivery() {
    let backend = MockPushBackend::accepting().await.unwrap();
    let mut settings = push_settings(&backend.url(), 3);
    settings.user = None;

    let outcome = MetricsPusher::new(settings, http_client()).push(PAYLOAD).await;

    assert_eq!(outcome, PushOutcome::Skipped(SkipReason::MissingCredentials));
    assert_eq!(backend.attempts(), 0);
}
