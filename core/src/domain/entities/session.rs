//! Session token issued after a successful verification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque session artifact handed back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    /// Signed token value
    pub token: String,
    /// Identity the session belongs to
    pub identity_id: Uuid,
    /// When the session stops being valid
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    /// Seconds left until expiry at `now` (0 once expired)
    pub fn max_age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// Claims carried by a signed session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (identity id)
    pub sub: String,
    /// Verified phone number
    pub phone: String,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Token id
    pub jti: String,
}
