//! Per-phone issuance rate limiting over a trailing window

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

use otp_shared::config::RateLimitConfig;

use crate::errors::{OtpError, OtpResult};
use crate::repositories::{IssuanceLedger, LedgerOutcome};

/// Decision of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Proceed; the request has been recorded
    Allowed { remaining: u32 },
    /// Deny; retry after the given number of seconds
    Throttled { retry_after_seconds: u64 },
}

/// Rate limiting contract used by the issuance service
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check the limit for `phone_number` and, when allowed, record the
    /// request in the same atomic step.
    ///
    /// A store failure is returned as `Err(StorageError)`; callers must
    /// treat it as a denial.
    async fn check_and_record(&self, phone_number: &str) -> OtpResult<RateLimitDecision>;
}

/// Rate limiter counting issuance records in a persistent ledger
pub struct LedgerRateLimiter<L: IssuanceLedger> {
    ledger: Arc<L>,
    config: RateLimitConfig,
}

impl<L: IssuanceLedger> LedgerRateLimiter<L> {
    pub fn new(ledger: Arc<L>, config: RateLimitConfig) -> Self {
        Self { ledger, config }
    }

    fn window(&self) -> Duration {
        Duration::seconds(self.config.window_seconds.min(u32::MAX as u64) as i64)
    }
}

#[async_trait]
impl<L: IssuanceLedger> RateLimiter for LedgerRateLimiter<L> {
    async fn check_and_record(&self, phone_number: &str) -> OtpResult<RateLimitDecision> {
        if !self.config.enabled {
            return Ok(RateLimitDecision::Allowed {
                remaining: u32::MAX,
            });
        }

        let now = Utc::now();
        let window = self.window();
        let outcome = self
            .ledger
            .record_if_below(phone_number, now, now - window, self.config.count)
            .await
            .map_err(|e| {
                tracing::error!(
                    phone = %otp_shared::phone::mask_phone(phone_number),
                    error = %e,
                    event = "rate_limit_store_failed",
                    "Rate limit check failed, denying request"
                );
                match e {
                    OtpError::StorageError { .. } => e,
                    other => OtpError::storage(other.to_string()),
                }
            })?;

        match outcome {
            LedgerOutcome::Recorded { count } => Ok(RateLimitDecision::Allowed {
                remaining: self.config.count.saturating_sub(count),
            }),
            LedgerOutcome::LimitReached { count, oldest } => {
                // the oldest record leaving the window frees a slot
                let retry_after_seconds = oldest
                    .map(|oldest| (oldest + window - now).num_seconds().max(1) as u64)
                    .unwrap_or(self.config.window_seconds);

                tracing::warn!(
                    phone = %otp_shared::phone::mask_phone(phone_number),
                    count = count,
                    limit = self.config.count,
                    retry_after_seconds = retry_after_seconds,
                    event = "rate_limit_exceeded",
                    "Code issuance rate limit exceeded"
                );
                Ok(RateLimitDecision::Throttled { retry_after_seconds })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryOtpStore;

    const PHONE: &str = "+573001234567";

    fn limiter(store: &InMemoryOtpStore, count: u32) -> LedgerRateLimiter<InMemoryOtpStore> {
        LedgerRateLimiter::new(
            Arc::new(store.clone()),
            RateLimitConfig {
                enabled: true,
                count,
                window_seconds: 600,
            },
        )
    }

    #[tokio::test]
    async fn test_allows_up_to_threshold_then_throttles() {
        let store = InMemoryOtpStore::new();
        let limiter = limiter(&store, 5);

        for remaining in (0..5).rev() {
            assert_eq!(
                limiter.check_and_record(PHONE).await.unwrap(),
                RateLimitDecision::Allowed { remaining }
            );
        }

        match limiter.check_and_record(PHONE).await.unwrap() {
            RateLimitDecision::Throttled { retry_after_seconds } => {
                assert!(retry_after_seconds > 590 && retry_after_seconds <= 600);
            }
            other => panic!("expected Throttled, got {:?}", other),
        }
        // a denied request is not recorded
        assert_eq!(store.ledger_len(PHONE).await, 5);
    }

    #[tokio::test]
    async fn test_limits_are_per_phone() {
        let store = InMemoryOtpStore::new();
        let limiter = limiter(&store, 1);

        assert!(matches!(
            limiter.check_and_record(PHONE).await.unwrap(),
            RateLimitDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check_and_record("+14155552671").await.unwrap(),
            RateLimitDecision::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn test_window_slides() {
        let store = InMemoryOtpStore::new();
        let limiter = limiter(&store, 2);

        limiter.check_and_record(PHONE).await.unwrap();
        limiter.check_and_record(PHONE).await.unwrap();
        store.backdate(PHONE, Duration::minutes(11)).await;

        assert!(matches!(
            limiter.check_and_record(PHONE).await.unwrap(),
            RateLimitDecision::Allowed { remaining: 1 }
        ));
    }

    #[tokio::test]
    async fn test_fails_closed_when_store_unavailable() {
        let store = InMemoryOtpStore::new();
        store.set_should_fail(true);
        let limiter = limiter(&store, 5);

        assert!(matches!(
            limiter.check_and_record(PHONE).await,
            Err(OtpError::StorageError { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_requests_cannot_exceed_threshold() {
        let store = InMemoryOtpStore::new();
        let limiter = Arc::new(limiter(&store, 5));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.check_and_record(PHONE).await.unwrap()
            }));
        }

        let mut allowed = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), RateLimitDecision::Allowed { .. }) {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5);
    }

    #[tokio::test]
    async fn test_disabled_limiter_always_allows() {
        let store = InMemoryOtpStore::new();
        let limiter = LedgerRateLimiter::new(
            Arc::new(store.clone()),
            RateLimitConfig {
                enabled: false,
                ..Default::default()
            },
        );

        for _ in 0..10 {
            assert!(matches!(
                limiter.check_and_record(PHONE).await.unwrap(),
                RateLimitDecision::Allowed { .. }
            ));
        }
        assert_eq!(store.ledger_len(PHONE).await, 0);
    }
}
