//! SMS gateway trait and dispatch types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::OtpResult;

/// Proof that a provider accepted a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    /// Provider-assigned message identifier
    pub message_id: String,
    /// Name of the provider that accepted the message
    pub provider: String,
}

/// Delivery state reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Accepted, not yet settled
    Pending,
    /// Delivered to the handset
    Delivered,
    /// Provider gave up
    Failed,
    /// Provider does not report status
    Unknown,
}

impl DeliveryStatus {
    /// Delivered or failed; further polling will not change it
    pub fn is_settled(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Failed)
    }
}

/// Dispatches verification codes to handsets
///
/// Implementations must never panic: every failure (transport, provider
/// rejection, bad credentials) is reduced to `Err(OtpError::GatewayError)`.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Send `code` to `phone_number` (E.164)
    async fn send(&self, phone_number: &str, code: &str) -> OtpResult<DispatchReceipt>;

    /// Current delivery status of a previously sent message
    ///
    /// Default implementation reports [`DeliveryStatus::Unknown`].
    async fn delivery_status(&self, _message_id: &str) -> OtpResult<DeliveryStatus> {
        Ok(DeliveryStatus::Unknown)
    }

    /// Provider name used in logs and receipts
    fn provider_name(&self) -> &str;
}

/// Text of the verification SMS
pub fn verification_message(brand: &str, code: &str, ttl_minutes: u64) -> String {
    format!(
        "Your {} verification code is: {}. This code expires in {} minutes.",
        brand, code, ttl_minutes
    )
}
