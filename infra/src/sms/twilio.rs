//! Twilio SMS gateway
//!
//! Talks to the Programmable Messaging REST API directly:
//!
//! - `POST /2010-04-01/Accounts/{sid}/Messages.json` with form fields
//!   `To`, `From`, `Body` to send
//! - `GET /2010-04-01/Accounts/{sid}/Messages/{message_sid}.json` for
//!   delivery status
//!
//! Both requests use HTTP basic auth with the account SID and auth token.
//! Twilio is only the transport here; codes are generated and checked
//! locally.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info};

use otp_core::errors::{OtpError, OtpResult};
use otp_core::services::sms::{verification_message, DeliveryStatus, DispatchReceipt, SmsGateway};
use otp_shared::config::SmsConfig;
use otp_shared::phone::{is_valid_e164, mask_phone};

use super::http::{build_client, send_with_retry, AttemptError, RetryPolicy};
use crate::InfrastructureError;

const PROVIDER: &str = "twilio";

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
    status: Option<String>,
}

/// Map a Twilio message status to a delivery status
fn map_status(status: &str) -> DeliveryStatus {
    match status {
        "accepted" | "scheduled" | "queued" | "sending" | "sent" => DeliveryStatus::Pending,
        "delivered" | "read" => DeliveryStatus::Delivered,
        "failed" | "undelivered" | "canceled" => DeliveryStatus::Failed,
        _ => DeliveryStatus::Unknown,
    }
}

/// Gateway backed by the Twilio REST API
pub struct TwilioSmsGateway {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    messages_url: String,
    brand: String,
    ttl_minutes: u64,
    retry: RetryPolicy,
}

impl TwilioSmsGateway {
    /// Create a gateway; fails when credentials are missing or the sending
    /// number is not E.164
    pub fn new(config: &SmsConfig, ttl_minutes: u64) -> Result<Self, InfrastructureError> {
        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| InfrastructureError::Config(format!("{} not set", name)))
        };

        let account_sid = required(&config.twilio_account_sid, "TWILIO_ACCOUNT_SID")?;
        let auth_token = required(&config.twilio_auth_token, "TWILIO_AUTH_TOKEN")?;
        let from_number = required(&config.twilio_from_number, "TWILIO_FROM_NUMBER")?;

        if !is_valid_e164(&from_number) {
            return Err(InfrastructureError::Config(
                "TWILIO_FROM_NUMBER must be in E.164 format (starting with '+')".to_string(),
            ));
        }

        info!(
            "Twilio SMS gateway initialized with from number: {}",
            mask_phone(&from_number)
        );

        Ok(Self {
            client: build_client(config)?,
            messages_url: format!(
                "{}/2010-04-01/Accounts/{}/Messages",
                config.twilio_base_url.trim_end_matches('/'),
                account_sid
            ),
            account_sid,
            auth_token,
            from_number,
            brand: config.brand.clone(),
            ttl_minutes,
            retry: RetryPolicy::from_config(config),
        })
    }

    async fn read_message(response: reqwest::Response) -> Result<TwilioMessage, AttemptError> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AttemptError::from_status(status, &text));
        }

        response
            .json::<TwilioMessage>()
            .await
            .map_err(|e| AttemptError::Permanent(format!("unreadable response: {}", e)))
    }

    async fn post_once(&self, form: &[(&str, &str)]) -> Result<TwilioMessage, AttemptError> {
        let response = self
            .client
            .post(format!("{}.json", self.messages_url))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(form)
            .send()
            .await
            .map_err(AttemptError::from_transport)?;

        Self::read_message(response).await
    }

    async fn fetch_once(&self, message_sid: &str) -> Result<TwilioMessage, AttemptError> {
        let response = self
            .client
            .get(format!("{}/{}.json", self.messages_url, message_sid))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .map_err(AttemptError::from_transport)?;

        Self::read_message(response).await
    }
}

#[async_trait]
impl SmsGateway for TwilioSmsGateway {
    async fn send(&self, phone_number: &str, code: &str) -> OtpResult<DispatchReceipt> {
        let body = verification_message(&self.brand, code, self.ttl_minutes);
        let form = [
            ("To", phone_number),
            ("From", self.from_number.as_str()),
            ("Body", body.as_str()),
        ];

        let message = send_with_retry(PROVIDER, self.retry, || self.post_once(&form))
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
            message_id = %message.sid,
            "SMS sent successfully"
        );

        Ok(DispatchReceipt {
            message_id: message.sid,
            provider: PROVIDER.to_string(),
        })
    }

    async fn delivery_status(&self, message_id: &str) -> OtpResult<DeliveryStatus> {
        let message = send_with_retry(PROVIDER, self.retry, || self.fetch_once(message_id))
            .await
            .map_err(OtpError::from)?;

        let status = message
            .status
            .as_deref()
            .map(map_status)
            .unwrap_or(DeliveryStatus::Unknown);
        debug!(provider = PROVIDER, message_id = %message.sid, status = ?status, "Fetched delivery status");
        Ok(status)
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }
}
