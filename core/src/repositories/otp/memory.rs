//! In-memory OTP store for tests and database-less development runs

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entities::VerificationAttempt;
use crate::errors::{OtpError, OtpResult};

use super::trait_::{IssuanceLedger, LedgerOutcome, OtpStore};

#[derive(Default)]
struct State {
    attempts: Vec<VerificationAttempt>,
    ledger: Vec<(String, DateTime<Utc>)>,
}

/// OTP store and issuance ledger backed by a single mutex
///
/// Every trait operation holds the mutex for its whole duration, which
/// makes `replace_outstanding`, `consume` and `record_if_below` atomic.
/// Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryOtpStore {
    state: Arc<Mutex<State>>,
    should_fail: Arc<AtomicBool>,
}

impl InMemoryOtpStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `StorageError`
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> OtpResult<()> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(OtpError::storage("in-memory store unavailable"));
        }
        Ok(())
    }

    /// All attempts stored for a phone number, oldest first
    pub async fn attempts_for(&self, phone_number: &str) -> Vec<VerificationAttempt> {
        let state = self.state.lock().await;
        state
            .attempts
            .iter()
            .filter(|a| a.phone_number == phone_number)
            .cloned()
            .collect()
    }

    /// Number of ledger records for a phone number
    pub async fn ledger_len(&self, phone_number: &str) -> usize {
        let state = self.state.lock().await;
        state.ledger.iter().filter(|(p, _)| p == phone_number).count()
    }

    /// Shift every timestamp stored for `phone_number` back by `by`,
    /// as if that much time had passed
    pub async fn backdate(&self, phone_number: &str, by: Duration) {
        let mut state = self.state.lock().await;
        for attempt in state.attempts.iter_mut().filter(|a| a.phone_number == phone_number) {
            attempt.issued_at -= by;
            attempt.expires_at -= by;
        }
        for (_, issued_at) in state.ledger.iter_mut().filter(|(p, _)| p == phone_number) {
            *issued_at -= by;
        }
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn invalidate_outstanding(&self, phone_number: &str) -> OtpResult<u64> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let before = state.attempts.len();
        state
            .attempts
            .retain(|a| a.phone_number != phone_number || a.consumed);
        Ok((before - state.attempts.len()) as u64)
    }

    async fn insert(&self, attempt: &VerificationAttempt) -> OtpResult<()> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        state.attempts.push(attempt.clone());
        Ok(())
    }

    async fn replace_outstanding(&self, attempt: &VerificationAttempt) -> OtpResult<u64> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let before = state.attempts.len();
        state
            .attempts
            .retain(|a| a.phone_number != attempt.phone_number || a.consumed);
        let removed = (before - state.attempts.len()) as u64;
        state.attempts.push(attempt.clone());
        Ok(removed)
    }

    async fn find_latest(&self, phone_number: &str) -> OtpResult<Option<VerificationAttempt>> {
        self.check_available()?;
        let state = self.state.lock().await;
        // last inserted wins ties on issued_at
        Ok(state
            .attempts
            .iter()
            .enumerate()
            .filter(|(_, a)| a.phone_number == phone_number)
            .max_by_key(|(i, a)| (a.issued_at, *i))
            .map(|(_, a)| a.clone()))
    }

    async fn consume(&self, id: Uuid) -> OtpResult<bool> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        match state.attempts.iter_mut().find(|a| a.id == id && !a.consumed) {
            Some(attempt) => {
                attempt.consumed = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn release(&self, id: Uuid) -> OtpResult<bool> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        match state.attempts.iter_mut().find(|a| a.id == id && a.consumed) {
            Some(attempt) => {
                attempt.consumed = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> OtpResult<u64> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let before = state.attempts.len();
        state.attempts.retain(|a| a.expires_at >= cutoff);
        Ok((before - state.attempts.len()) as u64)
    }
}

#[async_trait]
impl IssuanceLedger for InMemoryOtpStore {
    async fn record_if_below(
        &self,
        phone_number: &str,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
        limit: u32,
    ) -> OtpResult<LedgerOutcome> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        let in_window: Vec<DateTime<Utc>> = state
            .ledger
            .iter()
            .filter(|(p, at)| p == phone_number && *at > window_start)
            .map(|(_, at)| *at)
            .collect();
        let count = in_window.len() as u32;

        if count >= limit {
            return Ok(LedgerOutcome::LimitReached {
                count,
                oldest: in_window.into_iter().min(),
            });
        }

        state.ledger.push((phone_number.to_string(), now));
        Ok(LedgerOutcome::Recorded { count: count + 1 })
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> OtpResult<u64> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let before = state.ledger.len();
        state.ledger.retain(|(_, at)| *at >= cutoff);
        Ok((before - state.ledger.len()) as u64)
    }
}
