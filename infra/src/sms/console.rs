//! Development gateway that logs codes instead of sending them

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use otp_core::errors::OtpResult;
use otp_core::services::sms::{verification_message, DispatchReceipt, SmsGateway};
use otp_shared::phone::mask_phone;

/// Console SMS gateway for local development
///
/// The only place in the system where a code is written to the logs.
#[derive(Clone)]
pub struct ConsoleSmsGateway {
    /// Number of messages "sent" so far
    message_count: Arc<AtomicU64>,
    brand: String,
    ttl_minutes: u64,
}

impl ConsoleSmsGateway {
    pub fn new(brand: impl Into<String>, ttl_minutes: u64) -> Self {
        Self {
            message_count: Arc::new(AtomicU64::new(0)),
            brand: brand.into(),
            ttl_minutes,
        }
    }

    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmsGateway for ConsoleSmsGateway {
    async fn send(&self, phone_number: &str, code: &str) -> OtpResult<DispatchReceipt> {
        let message_id = format!("console_{}", Uuid::new_v4());
        let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            target: "sms_service",
            provider = "console",
            phone = %mask_phone(phone_number),
            message_id = %message_id,
            count = count,
            content = %verification_message(&self.brand, code, self.ttl_minutes),
            "Console SMS (not delivered)"
        );

        Ok(DispatchReceipt {
            message_id,
            provider: "console".to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        "console"
    }
}
