//! One-time passcode configuration

use serde::{Deserialize, Serialize};

use super::env_or;

/// Code generation, lifetime and operation budgets
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpConfig {
    /// How long an issued code stays redeemable
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Number of digits in a generated code
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// How long expired attempts are kept before the sweeper removes them
    #[serde(default = "default_retention_seconds")]
    pub retention_seconds: u64,

    /// Interval between retention sweeps (0 disables the background sweep)
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,

    /// Upper bound for the rate-limit check and persistence of an issue
    #[serde(default = "default_timeout_ms")]
    pub issue_timeout_ms: u64,

    /// Upper bound for handing a code to the SMS gateway
    #[serde(default = "default_dispatch_timeout_ms")]
    pub dispatch_timeout_ms: u64,

    /// Upper bound for a whole verify operation
    #[serde(default = "default_timeout_ms")]
    pub verify_timeout_ms: u64,

    /// Echo the generated code in the issue response (development only)
    #[serde(default)]
    pub expose_code_in_response: bool,

    /// Poll gateway delivery status after dispatch and log the result
    #[serde(default)]
    pub confirm_delivery: bool,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            code_length: default_code_length(),
            retention_seconds: default_retention_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
            issue_timeout_ms: default_timeout_ms(),
            dispatch_timeout_ms: default_dispatch_timeout_ms(),
            verify_timeout_ms: default_timeout_ms(),
            expose_code_in_response: false,
            confirm_delivery: false,
        }
    }
}

impl OtpConfig {
    /// Create from environment variables; `expose_default` is the code echo
    /// default for the current environment
    pub fn from_env(expose_default: bool) -> Self {
        let defaults = Self::default();
        Self {
            ttl_seconds: env_or("OTP_TTL_SECONDS", defaults.ttl_seconds),
            code_length: env_or("OTP_CODE_LENGTH", defaults.code_length),
            retention_seconds: env_or("OTP_RETENTION_SECONDS", defaults.retention_seconds),
            sweep_interval_seconds: env_or(
                "OTP_SWEEP_INTERVAL_SECONDS",
                defaults.sweep_interval_seconds,
            ),
            issue_timeout_ms: env_or("OTP_ISSUE_TIMEOUT_MS", defaults.issue_timeout_ms),
            dispatch_timeout_ms: env_or("OTP_DISPATCH_TIMEOUT_MS", defaults.dispatch_timeout_ms),
            verify_timeout_ms: env_or("OTP_VERIFY_TIMEOUT_MS", defaults.verify_timeout_ms),
            expose_code_in_response: env_or("OTP_EXPOSE_CODE", expose_default),
            confirm_delivery: env_or("OTP_CONFIRM_DELIVERY", defaults.confirm_delivery),
        }
    }

    /// Development settings: codes are echoed back to the client
    pub fn development() -> Self {
        Self {
            expose_code_in_response: true,
            ..Default::default()
        }
    }

    /// Code lifetime in whole minutes, rounded up (used in SMS text)
    pub fn ttl_minutes(&self) -> u64 {
        self.ttl_seconds.div_ceil(60)
    }
}

fn default_ttl_seconds() -> u64 {
    300 // 5 minutes
}

fn default_code_length() -> usize {
    6
}

fn default_retention_seconds() -> u64 {
    86_400 // 1 day
}

fn default_sweep_interval_seconds() -> u64 {
    3600
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_dispatch_timeout_ms() -> u64 {
    15_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_minutes_rounds_up() {
        let mut config = OtpConfig::default();
        assert_eq!(config.ttl_minutes(), 5);
        config.ttl_seconds = 61;
        assert_eq!(config.ttl_minutes(), 2);
    }
}
