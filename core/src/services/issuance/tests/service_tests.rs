//! Unit tests for the issuance service

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use otp_shared::config::RateLimitConfig;

use crate::errors::{OtpError, OtpResult};
use crate::repositories::{InMemoryOtpStore, OtpStore};
use crate::services::issuance::{Dispatch, IssuanceConfig, IssuanceService};
use crate::services::rate_limiter::{LedgerRateLimiter, RateLimitDecision, RateLimiter};
use crate::services::sms::{DeliveryStatus, MockSmsGateway, PollPolicy};

const PHONE: &str = "+573001234567";

type TestService = IssuanceService<InMemoryOtpStore, LedgerRateLimiter<InMemoryOtpStore>, MockSmsGateway>;

fn service_with(store: &InMemoryOtpStore, gateway: &MockSmsGateway, config: IssuanceConfig) -> TestService {
    let limiter = LedgerRateLimiter::new(Arc::new(store.clone()), RateLimitConfig::default());
    IssuanceService::new(
        Arc::new(store.clone()),
        Arc::new(limiter),
        Arc::new(gateway.clone()),
        config,
    )
    .unwrap()
}

fn service(store: &InMemoryOtpStore, gateway: &MockSmsGateway) -> TestService {
    service_with(store, gateway, IssuanceConfig::default())
}

#[tokio::test]
async fn test_issue_persists_then_sends() {
    let store = InMemoryOtpStore::new();
    let gateway = MockSmsGateway::new();
    let service = service(&store, &gateway);

    let outcome = service.issue(PHONE).await.unwrap();

    assert_eq!(outcome.phone_number, PHONE);
    assert!(outcome.dispatch.is_sent());
    assert_eq!(outcome.dev_code, None);

    let attempts = store.attempts_for(PHONE).await;
    assert_eq!(attempts.len(), 1);
    let attempt = &attempts[0];
    assert!(!attempt.consumed);
    assert_eq!(attempt.code.len(), 6);
    assert!(attempt.code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(attempt.expires_at, outcome.expires_at);

    let remaining = (attempt.expires_at - Utc::now()).num_seconds();
    assert!(remaining > 290 && remaining <= 300);

    assert_eq!(gateway.last_code_for(PHONE), Some(attempt.code.clone()));
}

#[tokio::test]
async fn test_issue_trims_surrounding_whitespace() {
    let store = InMemoryOtpStore::new();
    let gateway = MockSmsGateway::new();
    let service = service(&store, &gateway);

    let outcome = service.issue("  +573001234567 ").await.unwrap();

    assert_eq!(outcome.phone_number, PHONE);
    assert_eq!(store.attempts_for(PHONE).await.len(), 1);
}

#[tokio::test]
async fn test_invalid_phone_touches_nothing() {
    let store = InMemoryOtpStore::new();
    let gateway = MockSmsGateway::new();
    let service = service(&store, &gateway);

    for raw in ["", "573001234567", "+0123456", "+57 300 123 4567", "+1234567890123456"] {
        let result = service.issue(raw).await;
        assert!(
            matches!(result, Err(OtpError::InvalidPhoneNumber { .. })),
            "{:?} accepted",
            raw
        );
    }

    assert!(gateway.sent().is_empty());
    assert_eq!(store.ledger_len(PHONE).await, 0);
}

#[tokio::test]
async fn test_new_code_supersedes_previous() {
    let store = InMemoryOtpStore::new();
    let gateway = MockSmsGateway::new();
    let service = service(&store, &gateway);

    service.issue(PHONE).await.unwrap();
    let first = store.find_latest(PHONE).await.unwrap().unwrap();
    service.issue(PHONE).await.unwrap();
    let second = store.find_latest(PHONE).await.unwrap().unwrap();

    let attempts = store.attempts_for(PHONE).await;
    assert_eq!(attempts.len(), 1);
    assert_ne!(first.id, second.id);
    assert_eq!(attempts[0].id, second.id);
}

#[tokio::test]
async fn test_sixth_issue_is_throttled() {
    let store = InMemoryOtpStore::new();
    let gateway = MockSmsGateway::new();
    let service = service(&store, &gateway);

    for _ in 0..5 {
        service.issue(PHONE).await.unwrap();
    }

    match service.issue(PHONE).await {
        Err(OtpError::Throttled { retry_after_seconds }) => assert!(retry_after_seconds > 0),
        other => panic!("expected Throttled, got {:?}", other),
    }
    assert_eq!(gateway.sent().len(), 5);
}

#[tokio::test]
async fn test_gateway_failure_keeps_code() {
    let store = InMemoryOtpStore::new();
    let gateway = MockSmsGateway::failing();
    let service = service(&store, &gateway);

    let outcome = service.issue(PHONE).await.unwrap();

    match outcome.dispatch {
        Dispatch::Failed { reason } => assert!(reason.contains("SMS gateway error")),
        other => panic!("expected Failed dispatch, got {:?}", other),
    }
    let attempt = store.find_latest(PHONE).await.unwrap().unwrap();
    assert!(!attempt.consumed);
}

#[tokio::test]
async fn test_store_failure_aborts_before_send() {
    let store = InMemoryOtpStore::new();
    store.set_should_fail(true);
    let gateway = MockSmsGateway::new();
    let service = service(&store, &gateway);

    assert!(matches!(
        service.issue(PHONE).await,
        Err(OtpError::StorageError { .. })
    ));
    assert!(gateway.sent().is_empty());
}

#[tokio::test]
async fn test_dev_code_only_when_exposed() {
    let store = InMemoryOtpStore::new();
    let gateway = MockSmsGateway::new();
    let service = service_with(
        &store,
        &gateway,
        IssuanceConfig {
            expose_code: true,
            ..Default::default()
        },
    );

    let outcome = service.issue(PHONE).await.unwrap();

    let stored = store.find_latest(PHONE).await.unwrap().unwrap();
    assert_eq!(outcome.dev_code, Some(stored.code));
}

/// Limiter that stalls before answering
struct StalledLimiter(Duration);

#[async_trait]
impl RateLimiter for StalledLimiter {
    async fn check_and_record(&self, _phone_number: &str) -> OtpResult<RateLimitDecision> {
        tokio::time::sleep(self.0).await;
        Ok(RateLimitDecision::Allowed { remaining: 4 })
    }
}

#[tokio::test]
async fn test_slow_limiter_times_out_before_persisting() {
    let store = InMemoryOtpStore::new();
    let gateway = MockSmsGateway::new();
    let service = IssuanceService::new(
        Arc::new(store.clone()),
        Arc::new(StalledLimiter(Duration::from_millis(200))),
        Arc::new(gateway.clone()),
        IssuanceConfig {
            timeout: Duration::from_millis(20),
            ..Default::default()
        },
    )
    .unwrap();

    assert!(matches!(
        service.issue(PHONE).await,
        Err(OtpError::Timeout { operation: "issue", .. })
    ));
    assert!(store.find_latest(PHONE).await.unwrap().is_none());
    assert!(gateway.sent().is_empty());
}

#[tokio::test]
async fn test_slow_gateway_is_failed_dispatch() {
    let store = InMemoryOtpStore::new();
    let gateway = MockSmsGateway::new().with_delay(Duration::from_millis(200));
    let service = service_with(
        &store,
        &gateway,
        IssuanceConfig {
            timeout: Duration::from_millis(20),
            dispatch_timeout: Duration::from_millis(50),
            ..Default::default()
        },
    );

    let outcome = service.issue(PHONE).await.unwrap();

    match outcome.dispatch {
        Dispatch::Failed { reason } => assert!(reason.contains("timed out")),
        other => panic!("expected Failed dispatch, got {:?}", other),
    }
    let attempt = store.find_latest(PHONE).await.unwrap().unwrap();
    assert!(!attempt.consumed);
    assert_eq!(attempt.expires_at, outcome.expires_at);
    assert_eq!(store.ledger_len(PHONE).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_confirm_delivery_polls_in_background() {
    let store = InMemoryOtpStore::new();
    let gateway = MockSmsGateway::new()
        .with_statuses(vec![DeliveryStatus::Pending, DeliveryStatus::Delivered]);
    let service = service_with(
        &store,
        &gateway,
        IssuanceConfig {
            confirm_delivery: true,
            poll_policy: PollPolicy {
                max_attempts: 3,
                initial_delay: Duration::from_millis(100),
            },
            ..Default::default()
        },
    );

    let outcome = service.issue(PHONE).await.unwrap();
    assert!(outcome.dispatch.is_sent());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(gateway.status_calls(), 2);
}

#[test]
fn test_rejects_bad_generator_config() {
    let store = InMemoryOtpStore::new();
    let limiter = LedgerRateLimiter::new(Arc::new(store.clone()), RateLimitConfig::default());
    let result = IssuanceService::new(
        Arc::new(store),
        Arc::new(limiter),
        Arc::new(MockSmsGateway::new()),
        IssuanceConfig {
            code_length: 2,
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(OtpError::Config { .. })));
}
