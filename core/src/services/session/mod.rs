//! Session establishment after a successful verification
//!
//! The verification service only depends on [`SessionEstablisher`]; the
//! shipped implementation signs an HS256 JWT carried in a cookie by the API.

mod jwt;

pub use jwt::JwtSessionEstablisher;

use async_trait::async_trait;

use crate::domain::entities::{Identity, SessionToken};
use crate::errors::OtpResult;

/// Turns a verified identity into a session artifact
#[async_trait]
pub trait SessionEstablisher: Send + Sync {
    /// Create a session for `identity`
    ///
    /// # Returns
    /// * `Ok(SessionToken)` - Token plus expiry
    /// * `Err(OtpError::SessionError)` - Signing or storage failed
    async fn establish(&self, identity: &Identity) -> OtpResult<SessionToken>;
}
