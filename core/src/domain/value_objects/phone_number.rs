//! E.164 phone number value object

use serde::{Deserialize, Serialize};
use std::fmt;

use otp_shared::phone::{is_valid_e164, mask_phone};

use crate::errors::{OtpError, OtpResult};

/// A phone number known to be in E.164 shape
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse raw input, trimming surrounding whitespace.
    ///
    /// Fails with [`OtpError::InvalidPhoneNumber`] carrying the masked input.
    pub fn parse(raw: &str) -> OtpResult<Self> {
        let trimmed = raw.trim();
        if is_valid_e164(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(OtpError::InvalidPhoneNumber {
                phone: mask_phone(trimmed),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe form showing the last four digits
    pub fn masked(&self) -> String {
        mask_phone(&self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = OtpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}
