//! JWT encoding.
//!
//! Production token issuance lives in the account gateway; this encoder
//! mirrors its output for integration tests and local development.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

use campushub_core::config::AuthConfig;
use campushub_core::error::AppError;
use campushub_core::types::UserId;

use super::claims::Claims;

/// Signs access tokens compatible with [`super::JwtDecoder`].
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder").finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        }
    }

    /// Issues a token for the given user, valid for `ttl_seconds`.
    pub fn encode(
        &self,
        user_id: UserId,
        username: &str,
        avatar_ref: Option<String>,
        ttl_seconds: i64,
    ) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        self.encode_claims(&Claims {
            sub: user_id,
            username: username.to_string(),
            avatar_ref,
            iat: now,
            exp: now + ttl_seconds,
        })
    }

    /// Signs an explicit claims payload.
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))
    }
}
