//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use campushub_core::config::AuthConfig;
use campushub_core::error::AppError;

use super::claims::Claims;

/// Validates access tokens issued by the account gateway.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;
        // The gateway does not set aud; required_spec_claims defaults
        // would reject its tokens otherwise.
        validation.required_spec_claims = ["exp".to_string()].into_iter().collect();

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    ///
    /// Checks signature validity and expiration (with leeway). All
    /// failures map to the authentication error kind so callers can
    /// reject uniformly without leaking which check failed.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use campushub_core::error::ErrorKind;
    use campushub_core::types::UserId;
    use chrono::Utc;

    use super::*;
    use crate::jwt::encoder::JwtEncoder;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            leeway_seconds: 5,
        }
    }

    #[test]
    fn test_decode_valid_token() {
        let cfg = config();
        let encoder = JwtEncoder::new(&cfg);
        let user_id = UserId::new();
        let token = encoder.encode(user_id, "mika", None, 3600).unwrap();

        let claims = JwtDecoder::new(&cfg).decode(&token).unwrap();
        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.username, "mika");
    }

    #[test]
    fn test_decode_rejects_expired_token() {
        let cfg = config();
        let encoder = JwtEncoder::new(&cfg);
        let now = Utc::now().timestamp();
        let token = encoder
            .encode_claims(&Claims {
                sub: UserId::new(),
                username: "mika".to_string(),
                avatar_ref: None,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        let err = JwtDecoder::new(&cfg).decode(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        let encoder = JwtEncoder::new(&AuthConfig {
            jwt_secret: "other-secret".to_string(),
            leeway_seconds: 5,
        });
        let token = encoder.encode(UserId::new(), "mika", None, 3600).unwrap();

        let err = JwtDecoder::new(&config()).decode(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = JwtDecoder::new(&config()).decode("not-a-token").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }
}
