//! SMS gateway module
//!
//! Implementations of `otp_core`'s `SmsGateway`:
//!
//! - **Brevo**: transactional SMS REST API
//! - **Twilio**: Programmable Messaging REST API, with delivery status
//! - **Console**: logs messages for local development
//! - **Failover**: Brevo first, Twilio when Brevo fails
//!
//! The REST gateways share retry and error classification in `http`.

use std::sync::Arc;

use otp_core::services::sms::SmsGateway;
use otp_shared::config::{SmsConfig, SmsProvider};

pub mod brevo;
pub mod console;
pub mod failover;
mod http;
pub mod twilio;

pub use brevo::BrevoSmsGateway;
pub use console::ConsoleSmsGateway;
pub use failover::{FailoverSmsGateway, DEFAULT_FAILOVER_TIMEOUT};
pub use twilio::TwilioSmsGateway;

use crate::InfrastructureError;


/// Create the gateway selected by `config.provider`
///
/// Missing credentials for the selected provider are a configuration
/// error; there is no silent fallback to the console gateway.
pub fn create_sms_gateway(
    config: &SmsConfig,
    ttl_minutes: u64,
) -> Result<Arc<dyn SmsGateway>, InfrastructureError> {
    let gateway: Arc<dyn SmsGateway> = match config.provider {
        SmsProvider::Console => Arc::new(ConsoleSmsGateway::new(config.brand.clone(), ttl_minutes)),
        SmsProvider::Brevo => Arc::new(BrevoSmsGateway::new(config, ttl_minutes)?),
        SmsProvider::Twilio => Arc::new(TwilioSmsGateway::new(config, ttl_minutes)?),
        SmsProvider::Failover => Arc::new(FailoverSmsGateway::new(
            Arc::new(BrevoSmsGateway::new(config, ttl_minutes)?),
            Arc::new(TwilioSmsGateway::new(config, ttl_minutes)?),
            DEFAULT_FAILOVER_TIMEOUT,
        )),
    };

    tracing::info!("SMS gateway ready: {}", gateway.provider_name());
    Ok(gateway)
}
