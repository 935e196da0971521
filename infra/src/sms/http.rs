//! Shared HTTP plumbing for the REST gateways: client construction,
//! response classification and retry with exponential backoff.

use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use otp_shared::config::SmsConfig;

use crate::InfrastructureError;

/// How many times to try a request and how long to wait in between
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    /// Total attempts, at least one
    pub max_attempts: u32,
    /// Wait before the second attempt; doubled after each further one
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub(crate) fn from_config(config: &SmsConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            initial_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Failure of a single request
#[derive(Debug)]
pub(crate) enum AttemptError {
    /// Worth retrying: 429, 5xx, transport errors
    Transient(String),
    /// Not worth retrying: 4xx, malformed responses
    Permanent(String),
}

impl AttemptError {
    /// Classify a non-success HTTP response
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let message = format!("HTTP {}: {}", status.as_u16(), body.trim());
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            AttemptError::Transient(message)
        } else {
            AttemptError::Permanent(message)
        }
    }

    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        AttemptError::Transient(format!("request failed: {}", error))
    }
}

/// Build a client with the configured per-request timeout
pub(crate) fn build_client(config: &SmsConfig) -> Result<reqwest::Client, InfrastructureError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(InfrastructureError::Http)
}

/// Run `attempt` until it succeeds, fails permanently, or the policy runs out
pub(crate) async fn send_with_retry<T, F, Fut>(
    provider: &str,
    policy: RetryPolicy,
    mut attempt: F,
) -> Result<T, InfrastructureError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let mut delay = policy.initial_delay;
    let mut tries = 0;

    loop {
        tries += 1;
        debug!(
            provider = provider,
            attempt = tries,
            max_attempts = policy.max_attempts,
            "Sending request"
        );

        match attempt().await {
            Ok(value) => return Ok(value),
            Err(AttemptError::Permanent(message)) => {
                return Err(InfrastructureError::Sms(format!(
                    "{} rejected request: {}",
                    provider, message
                )));
            }
            Err(AttemptError::Transient(message)) => {
                if tries >= policy.max_attempts {
                    return Err(InfrastructureError::Sms(format!(
                        "{} failed after {} attempts: {}",
                        provider, tries, message
                    )));
                }
                warn!(
                    provider = provider,
                    attempt = tries,
                    max_attempts = policy.max_attempts,
                    backoff_ms = delay.as_millis() as u64,
                    error = %message,
                    "Retrying SMS provider request"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
}
