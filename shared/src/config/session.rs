//! Session configuration

use serde::{Deserialize, Serialize};

use super::env_or;

const DEFAULT_SECRET: &str = "development-secret-please-change-in-production";

/// Signed session token and cookie settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// HMAC secret for signing session tokens
    pub jwt_secret: String,

    /// Token issuer claim
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Token audience claim
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Session lifetime in minutes
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: i64,

    /// Name of the cookie carrying the session token
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Mark the cookie `Secure`
    #[serde(default)]
    pub cookie_secure: bool,

    /// Where the client goes after a successful verification
    #[serde(default = "default_redirect_to")]
    pub redirect_to: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_SECRET.to_string(),
            issuer: default_issuer(),
            audience: default_audience(),
            ttl_minutes: default_ttl_minutes(),
            cookie_name: default_cookie_name(),
            cookie_secure: false,
            redirect_to: default_redirect_to(),
        }
    }
}

impl SessionConfig {
    /// Create from environment variables
    pub fn from_env(secure_default: bool) -> Self {
        let defaults = Self::default();
        Self {
            jwt_secret: std::env::var("SESSION_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            ttl_minutes: env_or("SESSION_TTL_MINUTES", defaults.ttl_minutes),
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or(defaults.cookie_name),
            cookie_secure: env_or("SESSION_COOKIE_SECURE", secure_default),
            redirect_to: std::env::var("SESSION_REDIRECT_TO").unwrap_or(defaults.redirect_to),
            ..defaults
        }
    }

    /// Check if using the built-in development secret
    pub fn is_using_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_SECRET
    }
}

fn default_issuer() -> String {
    "otp-auth".to_string()
}

fn default_audience() -> String {
    "otp-auth-web".to_string()
}

fn default_ttl_minutes() -> i64 {
    60 * 24
}

fn default_cookie_name() -> String {
    "otp_session".to_string()
}

fn default_redirect_to() -> String {
    "/dashboard".to_string()
}
