use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Reject empty and whitespace-only values
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    /// E.164 phone number, e.g. "+573001234567"
    #[serde(alias = "phone", default)]
    #[validate(custom(function = "not_blank"))]
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[serde(alias = "phone", default)]
    #[validate(custom(function = "not_blank"))]
    pub phone_number: String,

    /// Code from the SMS
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOtpResponse {
    pub success: bool,
    /// Issued code, only echoed in development
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub redirect_to: String,
}
