//! Business services containing the issuance and verification flows.

pub mod code_generator;
pub mod issuance;
pub mod rate_limiter;
pub mod retention;
pub mod session;
pub mod sms;
pub mod verification;

// Re-export commonly used types
pub use code_generator::{CodeGenerator, GeneratedCode};
pub use issuance::{Dispatch, IssuanceConfig, IssuanceService, IssueOutcome};
pub use rate_limiter::{LedgerRateLimiter, RateLimitDecision, RateLimiter};
pub use retention::{RetentionConfig, RetentionSweeper, SweepResult};
pub use session::{JwtSessionEstablisher, SessionEstablisher};
pub use sms::{
    poll_delivery_status, verification_message, DeliveryStatus, DispatchReceipt, MockSmsGateway,
    PollPolicy, SmsGateway,
};
pub use verification::{VerificationConfig, VerificationService, VerifiedSession};
