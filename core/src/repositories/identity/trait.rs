//! Identity store trait: the narrow upsert contract over user accounts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::Identity;
use crate::errors::OtpResult;

/// Outcome of an identity upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUpsert {
    /// The identity after the upsert
    pub identity: Identity,
    /// `true` when the phone number had never been verified before
    pub created: bool,
}

/// Read/write access to identities keyed by phone number
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create the identity for `phone_number` or bump its `last_verified_at`
    ///
    /// Must be a single atomic operation per phone number: two concurrent
    /// upserts for an unseen number produce one identity.
    async fn upsert_verified(
        &self,
        phone_number: &str,
        verified_at: DateTime<Utc>,
    ) -> OtpResult<IdentityUpsert>;

    /// Find an identity by phone number
    async fn find_by_phone(&self, phone_number: &str) -> OtpResult<Option<Identity>>;
}
