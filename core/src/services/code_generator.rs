//! Numeric code generation backed by the OS CSPRNG

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, Rng};

use crate::errors::{OtpError, OtpResult};

/// Smallest and largest supported code lengths
pub const MIN_CODE_LENGTH: usize = 4;
pub const MAX_CODE_LENGTH: usize = 10;

/// A freshly generated code with its validity window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Produces fixed-length numeric codes and their expiry
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    code_length: usize,
    ttl: Duration,
}

impl CodeGenerator {
    /// Create a generator, rejecting lengths outside 4..=10 and a zero TTL
    pub fn new(code_length: usize, ttl_seconds: u64) -> OtpResult<Self> {
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&code_length) {
            return Err(OtpError::Config {
                message: format!(
                    "code length must be between {} and {}, got {}",
                    MIN_CODE_LENGTH, MAX_CODE_LENGTH, code_length
                ),
            });
        }
        if ttl_seconds == 0 || ttl_seconds > u32::MAX as u64 {
            return Err(OtpError::Config {
                message: format!("TTL must be a positive number of seconds, got {}", ttl_seconds),
            });
        }

        Ok(Self {
            code_length,
            ttl: Duration::seconds(ttl_seconds as i64),
        })
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a code issued at `issued_at`
    ///
    /// Digits are drawn one at a time with `gen_range(0..10)`, which keeps
    /// every code equally likely.
    pub fn generate(&self, issued_at: DateTime<Utc>) -> GeneratedCode {
        let mut rng = OsRng;
        let code: String = (0..self.code_length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();

        GeneratedCode {
            code,
            issued_at,
            expires_at: issued_at + self.ttl,
        }
    }
}
