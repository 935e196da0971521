//! Brevo transactional SMS gateway
//!
//! Sends through `POST /v3/transactionalSMS/sms` with the account API key
//! in the `api-key` header. Brevo does not expose per-message delivery
//! status on this endpoint, so `delivery_status` keeps the trait default.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use otp_core::errors::OtpResult;
use otp_core::services::sms::{verification_message, DispatchReceipt, SmsGateway};
use otp_shared::config::SmsConfig;
use otp_shared::phone::mask_phone;

use super::http::{build_client, send_with_retry, AttemptError, RetryPolicy};
use crate::InfrastructureError;

const PROVIDER: &str = "brevo";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSmsRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    unicode_enabled: bool,
    recipient: &'a str,
    content: &'a str,
    sender: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSmsResponse {
    /// Numeric in current API versions, string in older ones
    message_id: Option<serde_json::Value>,
    reference: Option<String>,
}

impl BrevoSmsResponse {
    fn message_id(&self) -> Option<String> {
        match &self.message_id {
            Some(serde_json::Value::String(id)) => Some(id.clone()),
            Some(serde_json::Value::Number(id)) => Some(id.to_string()),
            _ => self.reference.clone(),
        }
    }
}

/// Gateway backed by the Brevo REST API
pub struct BrevoSmsGateway {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    sender: String,
    brand: String,
    ttl_minutes: u64,
    retry: RetryPolicy,
}

impl BrevoSmsGateway {
    /// Create a gateway; fails when `BREVO_API_KEY` is missing
    pub fn new(config: &SmsConfig, ttl_minutes: u64) -> Result<Self, InfrastructureError> {
        let api_key = config
            .brevo_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| InfrastructureError::Config("BREVO_API_KEY not set".to_string()))?;

        info!("Brevo SMS gateway initialized with sender: {}", config.sender);

        Ok(Self {
            client: build_client(config)?,
            api_key,
            endpoint: format!(
                "{}/v3/transactionalSMS/sms",
                config.brevo_base_url.trim_end_matches('/')
            ),
            sender: config.sender.clone(),
            brand: config.brand.clone(),
            ttl_minutes,
            retry: RetryPolicy::from_config(config),
        })
    }

    async fn post_once(&self, body: &BrevoSmsRequest<'_>) -> Result<String, AttemptError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(AttemptError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AttemptError::from_status(status, &text));
        }

        let parsed: BrevoSmsResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Permanent(format!("unreadable response: {}", e)))?;

        parsed
            .message_id()
            .ok_or_else(|| AttemptError::Permanent("response carried no message id".to_string()))
    }
}

#[async_trait]
impl SmsGateway for BrevoSmsGateway {
    async fn send(&self, phone_number: &str, code: &str) -> OtpResult<DispatchReceipt> {
        let content = verification_message(&self.brand, code, self.ttl_minutes);
        let body = BrevoSmsRequest {
            kind: "transactional",
            unicode_enabled: false,
            recipient: phone_number,
            content: &content,
            sender: &self.sender,
        };

        let message_id = send_with_retry(PROVIDER, self.retry, || self.post_once(&body))
            .await
            .map_err(|e| {
                error!(
                    provider = PROVIDER,
                    phone = %mask_phone(phone_number),
                    error = %e,
                    "Failed to send SMS"
                );
                e
            })?;

        info!(
            provider = PROVIDER,
            phone = %mask_phone(phone_number),
            message_id = %message_id,
            "SMS sent successfully"
        );

        Ok(DispatchReceipt {
            message_id,
            provider: PROVIDER.to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }
}
