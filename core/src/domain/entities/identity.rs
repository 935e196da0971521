//! Identity entity: a phone number proven reachable at least once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account identity keyed by phone number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Identifier assigned at first successful verification
    pub id: Uuid,

    /// E.164 phone number, unique across identities
    pub phone_number: String,

    /// First successful verification
    pub created_at: DateTime<Utc>,

    /// Most recent successful verification
    pub last_verified_at: DateTime<Utc>,
}

impl Identity {
    /// Creates an identity for a phone number verified at `verified_at`
    pub fn new(phone_number: impl Into<String>, verified_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            phone_number: phone_number.into(),
            created_at: verified_at,
            last_verified_at: verified_at,
        }
    }

    /// Records another successful verification
    pub fn record_verification(&mut self, verified_at: DateTime<Utc>) {
        self.last_verified_at = verified_at;
    }
}
