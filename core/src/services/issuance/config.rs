//! Configuration for the issuance service

use std::time::Duration;

use otp_shared::config::{OtpConfig, SmsConfig};

use crate::services::sms::PollPolicy;

/// Configuration for the issuance service
#[derive(Debug, Clone)]
pub struct IssuanceConfig {
    /// Digits per code
    pub code_length: usize,
    /// Code lifetime in seconds
    pub ttl_seconds: u64,
    /// Budget for the limiter check and persistence
    pub timeout: Duration,
    /// Budget for the gateway send; exceeding it is a failed dispatch
    pub dispatch_timeout: Duration,
    /// Return the code in the outcome (development only)
    pub expose_code: bool,
    /// Poll delivery status in the background after dispatch
    pub confirm_delivery: bool,
    /// Status polling budget used when `confirm_delivery` is set
    pub poll_policy: PollPolicy,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self::new(&OtpConfig::default(), &SmsConfig::default())
    }
}

impl IssuanceConfig {
    pub fn new(otp: &OtpConfig, sms: &SmsConfig) -> Self {
        Self {
            code_length: otp.code_length,
            ttl_seconds: otp.ttl_seconds,
            timeout: Duration::from_millis(otp.issue_timeout_ms),
            dispatch_timeout: Duration::from_millis(otp.dispatch_timeout_ms),
            expose_code: otp.expose_code_in_response,
            confirm_delivery: otp.confirm_delivery,
            poll_policy: PollPolicy {
                max_attempts: sms.status_poll_attempts,
                initial_delay: Duration::from_millis(sms.status_poll_delay_ms),
            },
        }
    }
}
