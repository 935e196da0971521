//! OTP store and issuance ledger traits.
//!
//! The store exclusively owns verification attempts and issuance records.
//! Every per-phone invariant ("at most one outstanding attempt", "consume
//! exactly once", "count then record") is enforced here through the
//! backing store's atomic primitives, never through in-process locks held
//! by the services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::VerificationAttempt;
use crate::errors::OtpResult;

/// Persistence of verification attempts
///
/// # Example Implementation
/// ```no_run
/// use async_trait::async_trait;
/// use chrono::{DateTime, Utc};
/// use uuid::Uuid;
/// use otp_core::domain::entities::VerificationAttempt;
/// use otp_core::errors::OtpResult;
/// use otp_core::repositories::OtpStore;
///
/// struct NullStore;
///
/// #[async_trait]
/// impl OtpStore for NullStore {
///     async fn invalidate_outstanding(&self, _phone: &str) -> OtpResult<u64> { Ok(0) }
///     async fn insert(&self, _attempt: &VerificationAttempt) -> OtpResult<()> { Ok(()) }
///     async fn find_latest(&self, _phone: &str) -> OtpResult<Option<VerificationAttempt>> { Ok(None) }
///     async fn consume(&self, _id: Uuid) -> OtpResult<bool> { Ok(false) }
///     async fn release(&self, _id: Uuid) -> OtpResult<bool> { Ok(false) }
///     async fn purge_expired(&self, _cutoff: DateTime<Utc>) -> OtpResult<u64> { Ok(0) }
/// }
/// ```
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Delete every unconsumed attempt for a phone number
    ///
    /// Consumed attempts are kept until the retention sweep.
    ///
    /// # Returns
    /// * `Ok(n)` - Number of attempts removed
    /// * `Err(OtpError::StorageError)` - Store unavailable
    async fn invalidate_outstanding(&self, phone_number: &str) -> OtpResult<u64>;

    /// Persist a new attempt
    async fn insert(&self, attempt: &VerificationAttempt) -> OtpResult<()>;

    /// Invalidate prior outstanding attempts and persist `attempt` as one step
    ///
    /// The default runs the two calls in sequence. Stores that can serialize
    /// concurrent issuance for the same phone number (a transaction holding a
    /// per-phone lock) should override it so two simultaneous requests can
    /// never leave two outstanding attempts behind.
    async fn replace_outstanding(&self, attempt: &VerificationAttempt) -> OtpResult<u64> {
        let removed = self.invalidate_outstanding(&attempt.phone_number).await?;
        self.insert(attempt).await?;
        Ok(removed)
    }

    /// Most recently issued attempt for a phone number, consumed or not
    async fn find_latest(&self, phone_number: &str) -> OtpResult<Option<VerificationAttempt>>;

    /// Mark an attempt consumed, guarded by `consumed = false`
    ///
    /// # Returns
    /// * `Ok(true)` - This call flipped the flag
    /// * `Ok(false)` - The attempt was already consumed (or no longer exists);
    ///   a concurrent verification won the race
    async fn consume(&self, id: Uuid) -> OtpResult<bool>;

    /// Undo a `consume`, guarded by `consumed = true`
    ///
    /// Used when verification fails after the code was redeemed, so the
    /// caller can retry with the same code.
    ///
    /// # Returns
    /// * `Ok(true)` - The attempt is redeemable again
    /// * `Ok(false)` - The attempt was not consumed or no longer exists
    async fn release(&self, id: Uuid) -> OtpResult<bool>;

    /// Delete attempts whose `expires_at` is before `cutoff`
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> OtpResult<u64>;
}

/// Result of an atomic count-then-record on the issuance ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOutcome {
    /// A record was added; `count` includes it
    Recorded { count: u32 },
    /// The window is full; nothing was recorded
    LimitReached {
        count: u32,
        /// Oldest record still inside the window
        oldest: Option<DateTime<Utc>>,
    },
}

/// Append-only log of allowed issuance requests, read by the rate limiter
#[async_trait]
pub trait IssuanceLedger: Send + Sync {
    /// Count records for `phone_number` issued after `window_start`; when
    /// the count is below `limit`, record a new entry at `now`.
    ///
    /// The count and the insert must be atomic with respect to concurrent
    /// calls for the same phone number.
    async fn record_if_below(
        &self,
        phone_number: &str,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
        limit: u32,
    ) -> OtpResult<LedgerOutcome>;

    /// Delete records issued before `cutoff`
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> OtpResult<u64>;
}
