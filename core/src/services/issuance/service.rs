//! Main issuance service implementation

use chrono::Utc;
use std::sync::Arc;

use crate::domain::entities::VerificationAttempt;
use crate::domain::value_objects::PhoneNumber;
use crate::errors::{OtpError, OtpResult};
use crate::repositories::OtpStore;
use crate::services::code_generator::CodeGenerator;
use crate::services::rate_limiter::{RateLimitDecision, RateLimiter};
use crate::services::sms::{poll_delivery_status, DispatchReceipt, SmsGateway};

use super::config::IssuanceConfig;
use super::types::{Dispatch, IssueOutcome};

/// Issues one-time codes for phone numbers
pub struct IssuanceService<S, R, G>
where
    S: OtpStore,
    R: RateLimiter,
    G: SmsGateway + ?Sized + 'static,
{
    /// Verification attempt store
    store: Arc<S>,
    /// Per-phone issuance limiter
    rate_limiter: Arc<R>,
    /// SMS transport
    gateway: Arc<G>,
    generator: CodeGenerator,
    config: IssuanceConfig,
}

impl<S, R, G> IssuanceService<S, R, G>
where
    S: OtpStore,
    R: RateLimiter,
    G: SmsGateway + ?Sized + 'static,
{
    /// Create a new issuance service
    ///
    /// Fails with `OtpError::Config` when the code length or TTL is out of
    /// range.
    pub fn new(
        store: Arc<S>,
        rate_limiter: Arc<R>,
        gateway: Arc<G>,
        config: IssuanceConfig,
    ) -> OtpResult<Self> {
        let generator = CodeGenerator::new(config.code_length, config.ttl_seconds)?;
        Ok(Self {
            store,
            rate_limiter,
            gateway,
            generator,
            config,
        })
    }

    pub fn config(&self) -> &IssuanceConfig {
        &self.config
    }

    /// Issue a fresh code for `raw_phone` and send it by SMS
    ///
    /// # Returns
    /// * `Ok(IssueOutcome)` - Code persisted; see `dispatch` for the SMS result
    /// * `Err(InvalidPhoneNumber)` - Malformed number, nothing was touched
    /// * `Err(Throttled)` - Too many codes issued recently
    /// * `Err(StorageError)` - Store or limiter unavailable, nothing was sent
    /// * `Err(Timeout)` - Limiter or store exceeded the budget, nothing was sent
    pub async fn issue(&self, raw_phone: &str) -> OtpResult<IssueOutcome> {
        let phone = PhoneNumber::parse(raw_phone)?;
        let budget = self.config.timeout;

        let (attempt, code) = match tokio::time::timeout(budget, self.persist(&phone)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::error!(
                    phone = %phone.masked(),
                    timeout_ms = budget.as_millis() as u64,
                    event = "otp_issue_timeout",
                    "Code issuance timed out"
                );
                return Err(OtpError::Timeout {
                    operation: "issue",
                    after_ms: budget.as_millis() as u64,
                });
            }
        };

        // The code is stored and counted from here on, so dispatch problems
        // never fail the call
        let dispatch = self.dispatch(&phone, &code).await;

        Ok(IssueOutcome {
            phone_number: phone.as_str().to_string(),
            expires_at: attempt.expires_at,
            dispatch,
            dev_code: self.config.expose_code.then_some(code),
        })
    }

    /// Rate-limit check, code generation and atomic replace
    async fn persist(&self, phone: &PhoneNumber) -> OtpResult<(VerificationAttempt, String)> {
        match self.rate_limiter.check_and_record(phone.as_str()).await? {
            RateLimitDecision::Allowed { .. } => {}
            RateLimitDecision::Throttled { retry_after_seconds } => {
                return Err(OtpError::Throttled { retry_after_seconds });
            }
        }

        let generated = self.generator.generate(Utc::now());
        let attempt = VerificationAttempt::new(
            phone.as_str(),
            generated.code.clone(),
            generated.issued_at,
            generated.expires_at,
        );

        let superseded = self.store.replace_outstanding(&attempt).await.map_err(|e| {
            tracing::error!(
                phone = %phone.masked(),
                error = %e,
                event = "otp_store_failed",
                "Failed to persist verification attempt"
            );
            e
        })?;

        tracing::info!(
            phone = %phone.masked(),
            attempt_id = %attempt.id,
            superseded = superseded,
            expires_at = %attempt.expires_at,
            event = "otp_issued",
            "Verification code issued"
        );

        Ok((attempt, generated.code))
    }

    /// Hand the code to the gateway under the dispatch budget
    async fn dispatch(&self, phone: &PhoneNumber, code: &str) -> Dispatch {
        let budget = self.config.dispatch_timeout;
        let sent = match tokio::time::timeout(budget, self.gateway.send(phone.as_str(), code)).await {
            Ok(result) => result,
            Err(_) => Err(OtpError::Timeout {
                operation: "sms_dispatch",
                after_ms: budget.as_millis() as u64,
            }),
        };

        match sent {
            Ok(receipt) => {
                tracing::info!(
                    phone = %phone.masked(),
                    provider = %receipt.provider,
                    message_id = %receipt.message_id,
                    event = "otp_dispatched",
                    "Verification code sent"
                );
                if self.config.confirm_delivery {
                    self.spawn_delivery_check(phone, &receipt);
                }
                Dispatch::Sent { receipt }
            }
            Err(e) => {
                tracing::warn!(
                    phone = %phone.masked(),
                    provider = %self.gateway.provider_name(),
                    error = %e,
                    event = "otp_dispatch_failed",
                    "SMS dispatch failed, code remains valid"
                );
                Dispatch::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Poll delivery status off the request path and log where it settled
    fn spawn_delivery_check(&self, phone: &PhoneNumber, receipt: &DispatchReceipt) {
        let gateway = Arc::clone(&self.gateway);
        let policy = self.config.poll_policy;
        let message_id = receipt.message_id.clone();
        let masked = phone.masked();

        tokio::spawn(async move {
            let status = poll_delivery_status(gateway.as_ref(), &message_id, policy).await;
            tracing::info!(
                phone = %masked,
                message_id = %message_id,
                status = ?status,
                event = "otp_delivery_status",
                "SMS delivery status"
            );
        });
    }
}
