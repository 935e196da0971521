//! Verification attempt entity: one issued code for one phone number.

use chrono::{DateTime, Utc};
use constant_time_eq::constant_time_eq;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default number of digits in a code
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Default code lifetime (5 minutes)
pub const DEFAULT_TTL_SECONDS: u64 = 300;

/// An issued code and its redemption state
///
/// Created by the issuance service. The only mutation ever applied is the
/// `consumed` flag flipping from `false` to `true`, done by the store's
/// conditional consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationAttempt {
    /// Unique identifier, addresses the row in the conditional consume
    pub id: Uuid,

    /// E.164 phone number the code was issued for
    pub phone_number: String,

    /// Numeric code
    pub code: String,

    /// When the code was issued
    pub issued_at: DateTime<Utc>,

    /// When the code stops being redeemable; always after `issued_at`
    pub expires_at: DateTime<Utc>,

    /// Whether the code has been redeemed
    pub consumed: bool,
}

impl VerificationAttempt {
    /// Creates a fresh, unconsumed attempt
    pub fn new(
        phone_number: impl Into<String>,
        code: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        debug_assert!(expires_at > issued_at);
        Self {
            id: Uuid::new_v4(),
            phone_number: phone_number.into(),
            code: code.into(),
            issued_at,
            expires_at,
            consumed: false,
        }
    }

    /// `true` once `now` is past `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Unconsumed and unexpired at `now`
    pub fn is_outstanding_at(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && !self.is_expired_at(now)
    }

    /// Constant-time comparison against a submitted code
    pub fn code_matches(&self, submitted: &str) -> bool {
        constant_time_eq(self.code.as_bytes(), submitted.as_bytes())
    }
}
