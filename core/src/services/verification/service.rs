//! Main verification service implementation

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::value_objects::PhoneNumber;
use crate::errors::{OtpError, OtpResult};
use crate::repositories::{IdentityStore, OtpStore};
use crate::services::session::SessionEstablisher;

use super::config::VerificationConfig;
use super::types::VerifiedSession;

/// Redeems codes and establishes sessions
pub struct VerificationService<S, I, E>
where
    S: OtpStore,
    I: IdentityStore,
    E: SessionEstablisher + ?Sized,
{
    /// Verification attempt store
    store: Arc<S>,
    /// Identity upserts
    identities: Arc<I>,
    /// Session issuer
    sessions: Arc<E>,
    config: VerificationConfig,
}

impl<S, I, E> VerificationService<S, I, E>
where
    S: OtpStore,
    I: IdentityStore,
    E: SessionEstablisher + ?Sized,
{
    pub fn new(store: Arc<S>, identities: Arc<I>, sessions: Arc<E>, config: VerificationConfig) -> Self {
        Self {
            store,
            identities,
            sessions,
            config,
        }
    }

    /// Verify `submitted_code` for `raw_phone`
    ///
    /// # Returns
    /// * `Ok(VerifiedSession)` - Code redeemed, identity upserted, session issued
    /// * `Err(InvalidPhoneNumber)` - Malformed number
    /// * `Err(NotFound | AlreadyUsed | Expired | Mismatch)` - Code rejected
    /// * `Err(StorageError | SessionError | Timeout)` - Transient failure; a
    ///   code consumed during the call is released so a retry can redeem it
    pub async fn verify(&self, raw_phone: &str, submitted_code: &str) -> OtpResult<VerifiedSession> {
        let phone = PhoneNumber::parse(raw_phone)?;
        let budget = self.config.timeout;
        let mut consumed = None;

        let result = match tokio::time::timeout(
            budget,
            self.verify_inner(&phone, submitted_code, &mut consumed),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    phone = %phone.masked(),
                    timeout_ms = budget.as_millis() as u64,
                    event = "otp_verify_timeout",
                    "Code verification timed out"
                );
                Err(OtpError::Timeout {
                    operation: "verify",
                    after_ms: budget.as_millis() as u64,
                })
            }
        };

        if let (Err(_), Some(attempt_id)) = (&result, consumed) {
            self.release(&phone, attempt_id).await;
        }
        result
    }

    /// Make a consumed attempt redeemable again after a later step failed
    async fn release(&self, phone: &PhoneNumber, attempt_id: Uuid) {
        match self.store.release(attempt_id).await {
            Ok(released) => tracing::info!(
                phone = %phone.masked(),
                attempt_id = %attempt_id,
                released = released,
                event = "otp_released",
                "Released code after failed verification"
            ),
            Err(e) => tracing::error!(
                phone = %phone.masked(),
                attempt_id = %attempt_id,
                error = %e,
                event = "otp_release_failed",
                "Failed to release code after failed verification"
            ),
        }
    }

    /// Runs the checks; sets `consumed` once this call has redeemed the code
    async fn verify_inner(
        &self,
        phone: &PhoneNumber,
        submitted_code: &str,
        consumed: &mut Option<Uuid>,
    ) -> OtpResult<VerifiedSession> {
        let now = Utc::now();

        let attempt = self
            .store
            .find_latest(phone.as_str())
            .await?
            .ok_or_else(|| self.rejected(phone, OtpError::NotFound))?;

        if attempt.consumed {
            return Err(self.rejected(phone, OtpError::AlreadyUsed));
        }
        if attempt.is_expired_at(now) {
            return Err(self.rejected(phone, OtpError::Expired));
        }
        if !attempt.code_matches(submitted_code.trim()) {
            return Err(self.rejected(phone, OtpError::Mismatch));
        }

        // Conditional update; a concurrent verify may have flipped it first
        if !self.store.consume(attempt.id).await? {
            return Err(self.rejected(phone, OtpError::AlreadyUsed));
        }
        *consumed = Some(attempt.id);

        let upsert = self.identities.upsert_verified(phone.as_str(), now).await?;
        let session = self.sessions.establish(&upsert.identity).await.map_err(|e| {
            tracing::error!(
                phone = %phone.masked(),
                identity_id = %upsert.identity.id,
                error = %e,
                event = "session_failed",
                "Failed to establish session"
            );
            e
        })?;

        tracing::info!(
            phone = %phone.masked(),
            identity_id = %upsert.identity.id,
            new_identity = upsert.created,
            event = "otp_verified",
            "Phone number verified"
        );

        Ok(VerifiedSession {
            identity: upsert.identity,
            session,
            new_identity: upsert.created,
        })
    }

    fn rejected(&self, phone: &PhoneNumber, reason: OtpError) -> OtpError {
        tracing::warn!(
            phone = %phone.masked(),
            reason = reason.code(),
            event = "otp_rejected",
            "Verification code rejected"
        );
        reason
    }
}
