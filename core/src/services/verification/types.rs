//! Verification results

use serde::Serialize;

use crate::domain::entities::{Identity, SessionToken};

/// Result of a successful `verify`
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedSession {
    /// Identity owning the verified phone number
    pub identity: Identity,
    /// Session handed to the client
    pub session: SessionToken,
    /// `true` when this verification created the identity
    pub new_identity: bool,
}
