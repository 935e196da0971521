//! HS256 session tokens

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use otp_shared::config::SessionConfig;

use crate::domain::entities::{Identity, SessionClaims, SessionToken};
use crate::errors::{OtpError, OtpResult};

use super::SessionEstablisher;

/// Signs session tokens with a shared secret
pub struct JwtSessionEstablisher {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: SessionConfig,
}

impl JwtSessionEstablisher {
    pub fn new(config: SessionConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);

        Self {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Decode and check a session token issued by this establisher
    pub fn validate(&self, token: &str) -> OtpResult<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let message = match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => "session expired".to_string(),
                    _ => format!("invalid session token: {}", e),
                };
                OtpError::SessionError { message }
            })
    }
}

#[async_trait]
impl SessionEstablisher for JwtSessionEstablisher {
    async fn establish(&self, identity: &Identity) -> OtpResult<SessionToken> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(self.config.ttl_minutes);

        let claims = SessionClaims {
            sub: identity.id.to_string(),
            phone: identity.phone_number.clone(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            OtpError::SessionError {
                message: format!("failed to sign session token: {}", e),
            }
        })?;

        tracing::debug!(
            identity_id = %identity.id,
            expires_at = %expires_at,
            event = "session_established",
            "Session token issued"
        );

        Ok(SessionToken {
            token,
            identity_id: identity.id,
            expires_at,
        })
    }
}
