//! SMS gateway contract consumed by the issuance service.
//!
//! Provider implementations (Brevo, Twilio, console) live in `otp_infra`.
//! [`MockSmsGateway`] is a scriptable double for tests.

pub mod mock;
pub mod polling;
pub mod traits;

pub use mock::MockSmsGateway;
pub use polling::{poll_delivery_status, PollPolicy};
pub use traits::{verification_message, DeliveryStatus, DispatchReceipt, SmsGateway};
