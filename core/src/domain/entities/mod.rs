//! Domain entities representing core business objects.

pub mod identity;
pub mod session;
pub mod verification_attempt;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use identity::Identity;
pub use session::{SessionClaims, SessionToken};
pub use verification_attempt::{VerificationAttempt, DEFAULT_CODE_LENGTH, DEFAULT_TTL_SECONDS};
