//! SMS provider configuration

use serde::{Deserialize, Serialize};

use super::env_or;

/// Which SMS gateway delivers codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SmsProvider {
    /// Log codes instead of sending them
    #[default]
    Console,
    /// Brevo transactional SMS
    Brevo,
    /// Twilio programmable messaging
    Twilio,
    /// Brevo first, Twilio when Brevo fails
    Failover,
}

impl std::str::FromStr for SmsProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" | "mock" | "log" => Ok(SmsProvider::Console),
            "brevo" => Ok(SmsProvider::Brevo),
            "twilio" => Ok(SmsProvider::Twilio),
            "failover" => Ok(SmsProvider::Failover),
            _ => Err(format!("Unknown SMS provider: {}", s)),
        }
    }
}

/// SMS gateway credentials and delivery policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmsConfig {
    /// Selected provider
    #[serde(default)]
    pub provider: SmsProvider,

    /// Product name used in the message text
    #[serde(default = "default_brand")]
    pub brand: String,

    /// Alphanumeric sender id (Brevo)
    #[serde(default = "default_brand")]
    pub sender: String,

    /// Brevo API key
    #[serde(default)]
    pub brevo_api_key: Option<String>,

    /// Brevo API base URL
    #[serde(default = "default_brevo_base_url")]
    pub brevo_base_url: String,

    /// Twilio account SID
    #[serde(default)]
    pub twilio_account_sid: Option<String>,

    /// Twilio auth token
    #[serde(default)]
    pub twilio_auth_token: Option<String>,

    /// Twilio sending number (E.164)
    #[serde(default)]
    pub twilio_from_number: Option<String>,

    /// Twilio API base URL
    #[serde(default = "default_twilio_base_url")]
    pub twilio_base_url: String,

    /// Maximum send attempts per message
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (doubled per retry)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Timeout for a single provider request in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Delivery status polls after dispatch
    #[serde(default = "default_status_poll_attempts")]
    pub status_poll_attempts: u32,

    /// Initial delay between status polls in milliseconds
    #[serde(default = "default_status_poll_delay_ms")]
    pub status_poll_delay_ms: u64,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            provider: SmsProvider::default(),
            brand: default_brand(),
            sender: default_brand(),
            brevo_api_key: None,
            brevo_base_url: default_brevo_base_url(),
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_from_number: None,
            twilio_base_url: default_twilio_base_url(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            status_poll_attempts: default_status_poll_attempts(),
            status_poll_delay_ms: default_status_poll_delay_ms(),
        }
    }
}

impl SmsConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let provider = match std::env::var("SMS_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.provider,
        };

        Ok(Self {
            provider,
            brand: std::env::var("SMS_BRAND").unwrap_or(defaults.brand),
            sender: std::env::var("SMS_SENDER").unwrap_or(defaults.sender),
            brevo_api_key: std::env::var("BREVO_API_KEY").ok(),
            brevo_base_url: std::env::var("BREVO_BASE_URL").unwrap_or(defaults.brevo_base_url),
            twilio_account_sid: std::env::var("TWILIO_ACCOUNT_SID").ok(),
            twilio_auth_token: std::env::var("TWILIO_AUTH_TOKEN").ok(),
            twilio_from_number: std::env::var("TWILIO_FROM_NUMBER").ok(),
            twilio_base_url: std::env::var("TWILIO_BASE_URL").unwrap_or(defaults.twilio_base_url),
            max_retries: env_or("SMS_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("SMS_RETRY_DELAY_MS", defaults.retry_delay_ms),
            request_timeout_secs: env_or("SMS_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            status_poll_attempts: env_or("SMS_STATUS_POLL_ATTEMPTS", defaults.status_poll_attempts),
            status_poll_delay_ms: env_or("SMS_STATUS_POLL_DELAY_MS", defaults.status_poll_delay_ms),
        })
    }
}

fn default_brand() -> String {
    "YourExchange".to_string()
}

fn default_brevo_base_url() -> String {
    "https://api.brevo.com".to_string()
}

fn default_twilio_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_status_poll_attempts() -> u32 {
    3
}

fn default_status_poll_delay_ms() -> u64 {
    500
}
