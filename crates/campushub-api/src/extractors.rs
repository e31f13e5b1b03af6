//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use campushub_core::error::AppError;
use campushub_entity::user::User;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated user behind a `Bearer` token.
///
/// Decodes the token and resolves the user against the directory, so a
/// token for a deleted account is rejected even while unexpired.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::authentication("Expected a Bearer token"))?;

        let claims = state.jwt_decoder.decode(token)?;
        let user = state
            .users
            .by_id(claims.user_id())
            .await?
            .ok_or_else(|| AppError::authentication("User no longer exists"))?;
        Ok(Self(user))
    }
}
