//! Tests for the in-memory OTP store and ledger

use chrono::{Duration, Utc};

use crate::domain::entities::VerificationAttempt;
use crate::errors::OtpError;
use crate::repositories::otp::{InMemoryOtpStore, IssuanceLedger, LedgerOutcome, OtpStore};

const PHONE: &str = "+573001234567";

fn attempt(code: &str) -> VerificationAttempt {
    let now = Utc::now();
    VerificationAttempt::new(PHONE, code, now, now + Duration::minutes(5))
}

#[tokio::test]
async fn test_replace_outstanding_keeps_single_unconsumed_attempt() {
    let store = InMemoryOtpStore::new();

    store.replace_outstanding(&attempt("111111")).await.unwrap();
    let removed = store.replace_outstanding(&attempt("222222")).await.unwrap();

    assert_eq!(removed, 1);
    let attempts = store.attempts_for(PHONE).await;
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].code, "222222");
}

#[tokio::test]
async fn test_invalidate_keeps_consumed_attempts() {
    let store = InMemoryOtpStore::new();
    let first = attempt("111111");
    store.insert(&first).await.unwrap();
    assert!(store.consume(first.id).await.unwrap());

    store.insert(&attempt("222222")).await.unwrap();
    let removed = store.invalidate_outstanding(PHONE).await.unwrap();

    assert_eq!(removed, 1);
    let remaining = store.attempts_for(PHONE).await;
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].consumed);
}

#[tokio::test]
async fn test_find_latest_prefers_newest() {
    let store = InMemoryOtpStore::new();
    let now = Utc::now();
    let older = VerificationAttempt::new(PHONE, "111111", now - Duration::minutes(2), now + Duration::minutes(3));
    let newer = VerificationAttempt::new(PHONE, "222222", now, now + Duration::minutes(5));
    store.insert(&newer).await.unwrap();
    store.insert(&older).await.unwrap();

    let latest = store.find_latest(PHONE).await.unwrap().unwrap();
    assert_eq!(latest.code, "222222");
    assert!(store.find_latest("+14155552671").await.unwrap().is_none());
}

#[tokio::test]
async fn test_consume_is_exactly_once() {
    let store = InMemoryOtpStore::new();
    let a = attempt("123456");
    store.insert(&a).await.unwrap();

    assert!(store.consume(a.id).await.unwrap());
    assert!(!store.consume(a.id).await.unwrap());
}

#[tokio::test]
async fn test_release_reopens_consumed_attempt() {
    let store = InMemoryOtpStore::new();
    let a = attempt("123456");
    store.insert(&a).await.unwrap();

    assert!(!store.release(a.id).await.unwrap());
    assert!(store.consume(a.id).await.unwrap());
    assert!(store.release(a.id).await.unwrap());
    assert!(!store.find_latest(PHONE).await.unwrap().unwrap().consumed);
    assert!(store.consume(a.id).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_consume_has_one_winner() {
    let store = InMemoryOtpStore::new();
    let a = attempt("123456");
    store.insert(&a).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        let id = a.id;
        handles.push(tokio::spawn(async move { store.consume(id).await.unwrap() }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_record_if_below_stops_at_limit() {
    let store = InMemoryOtpStore::new();
    let now = Utc::now();
    let window_start = now - Duration::minutes(10);

    for expected in 1..=3 {
        let outcome = store.record_if_below(PHONE, now, window_start, 3).await.unwrap();
        assert_eq!(outcome, LedgerOutcome::Recorded { count: expected });
    }

    match store.record_if_below(PHONE, now, window_start, 3).await.unwrap() {
        LedgerOutcome::LimitReached { count, oldest } => {
            assert_eq!(count, 3);
            assert_eq!(oldest, Some(now));
        }
        other => panic!("expected LimitReached, got {:?}", other),
    }
    assert_eq!(store.ledger_len(PHONE).await, 3);
}

#[tokio::test]
async fn test_ledger_ignores_records_outside_window() {
    let store = InMemoryOtpStore::new();
    let now = Utc::now();
    store.record_if_below(PHONE, now, now - Duration::minutes(10), 1).await.unwrap();
    store.backdate(PHONE, Duration::minutes(11)).await;

    let outcome = store
        .record_if_below(PHONE, Utc::now(), Utc::now() - Duration::minutes(10), 1)
        .await
        .unwrap();
    assert_eq!(outcome, LedgerOutcome::Recorded { count: 1 });
}

#[tokio::test]
async fn test_purge_removes_only_old_rows() {
    let store = InMemoryOtpStore::new();
    let now = Utc::now();
    store.insert(&attempt("111111")).await.unwrap();
    store.record_if_below(PHONE, now, now - Duration::minutes(10), 5).await.unwrap();
    store.backdate(PHONE, Duration::days(2)).await;
    store.insert(&attempt("222222")).await.unwrap();

    let cutoff = Utc::now() - Duration::days(1);
    assert_eq!(store.purge_expired(cutoff).await.unwrap(), 1);
    assert_eq!(store.purge_before(cutoff).await.unwrap(), 1);
    assert_eq!(store.attempts_for(PHONE).await.len(), 1);
}

#[tokio::test]
async fn test_failure_injection() {
    let store = InMemoryOtpStore::new();
    store.set_should_fail(true);

    assert!(matches!(
        store.find_latest(PHONE).await,
        Err(OtpError::StorageError { .. })
    ));
    let now = Utc::now();
    assert!(store.record_if_below(PHONE, now, now, 5).await.is_err());
}
