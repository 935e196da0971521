//! Configuration for the verification service

use std::time::Duration;

use otp_shared::config::OtpConfig;

/// Configuration for the verification service
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Budget for a whole `verify` call
    pub timeout: Duration,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self::new(&OtpConfig::default())
    }
}

impl VerificationConfig {
    pub fn new(otp: &OtpConfig) -> Self {
        Self {
            timeout: Duration::from_millis(otp.verify_timeout_ms),
        }
    }
}
