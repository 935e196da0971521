//! Rate limiting configuration module

use serde::{Deserialize, Serialize};

use super::env_or;

/// Per-phone issuance rate limit
///
/// A phone number may trigger at most `count` code issuances within any
/// trailing `window_seconds` window.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum issuances per phone number per window
    #[serde(default = "default_count")]
    pub count: u32,

    /// Trailing window length in seconds
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            count: default_count(),
            window_seconds: default_window_seconds(),
        }
    }
}

impl RateLimitConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_or("RATE_LIMIT_ENABLED", defaults.enabled),
            count: env_or("RATE_LIMIT_COUNT", defaults.count),
            window_seconds: env_or("RATE_LIMIT_WINDOW_SECONDS", defaults.window_seconds),
        }
    }

    /// Relaxed limits for local development
    pub fn development() -> Self {
        Self {
            count: 20,
            ..Default::default()
        }
    }

    /// Production limits
    pub fn production() -> Self {
        Self::default()
    }
}

fn default_enabled() -> bool {
    true
}

fn default_count() -> u32 {
    5
}

fn default_window_seconds() -> u64 {
    600 // 10 minutes
}
