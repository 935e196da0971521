//! Issuance results

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::services::sms::DispatchReceipt;

/// What happened to the SMS carrying a freshly issued code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Dispatch {
    /// The provider accepted the message
    Sent { receipt: DispatchReceipt },
    /// The provider rejected the message or could not be reached; the code
    /// is still valid
    Failed { reason: String },
}

impl Dispatch {
    pub fn is_sent(&self) -> bool {
        matches!(self, Dispatch::Sent { .. })
    }
}

/// Result of a successful `issue`
#[derive(Debug, Clone, Serialize)]
pub struct IssueOutcome {
    /// Normalized E.164 number the code was issued for
    pub phone_number: String,
    /// When the code stops being redeemable
    pub expires_at: DateTime<Utc>,
    /// SMS dispatch result
    pub dispatch: Dispatch,
    /// The code itself, only when code echo is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_code: Option<String>,
}
