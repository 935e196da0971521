//! Authentication route handlers
//!
//! - `send-otp` issues a code and sends it by SMS
//! - `verify-otp` redeems a code and sets the session cookie

pub mod send_otp;
pub mod verify_otp;

use std::sync::Arc;

use otp_core::errors::OtpResult;
use otp_core::repositories::{IdentityStore, IssuanceLedger, OtpStore};
use otp_core::services::{
    IssuanceConfig, IssuanceService, LedgerRateLimiter, SessionEstablisher, SmsGateway,
    VerificationConfig, VerificationService,
};
use otp_shared::config::{AppConfig, SessionConfig};

pub use send_otp::send_otp;
pub use verify_otp::verify_otp;

/// Application state that holds shared services
pub struct AppState<S, I>
where
    S: OtpStore + IssuanceLedger + 'static,
    I: IdentityStore + 'static,
{
    pub issuance: Arc<IssuanceService<S, LedgerRateLimiter<S>, dyn SmsGateway>>,
    pub verification: Arc<VerificationService<S, I, dyn SessionEstablisher>>,
    /// Cookie name, flags and redirect target
    pub session: SessionConfig,
}

impl<S, I> AppState<S, I>
where
    S: OtpStore + IssuanceLedger + 'static,
    I: IdentityStore + 'static,
{
    /// Wire both services around one attempt store
    pub fn new(
        store: Arc<S>,
        identities: Arc<I>,
        gateway: Arc<dyn SmsGateway>,
        sessions: Arc<dyn SessionEstablisher>,
        config: &AppConfig,
    ) -> OtpResult<Self> {
        let rate_limiter = Arc::new(LedgerRateLimiter::new(store.clone(), config.rate_limit.clone()));
        let issuance = IssuanceService::new(
            store.clone(),
            rate_limiter,
            gateway,
            IssuanceConfig::new(&config.otp, &config.sms),
        )?;
        let verification = VerificationService::new(
            store,
            identities,
            sessions,
            VerificationConfig::new(&config.otp),
        );

        Ok(Self {
            issuance: Arc::new(issuance),
            verification: Arc::new(verification),
            session: config.session.clone(),
        })
    }
}
