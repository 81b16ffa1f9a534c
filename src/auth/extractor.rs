use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::{auth::repo_types::User, error::ApiError, state::AppState};

/// Authenticated principal for protected routes. Verifies the bearer token,
/// then resolves the account it names; a token whose user has since vanished
/// is rejected the same way as a bad token.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(ApiError::Unauthenticated("No token, authorization denied"))?;

        let token = header.strip_prefix("Bearer ").unwrap_or(header);

        let claims = state.tokens.verify(token).map_err(|e| {
            warn!(error = %e, "bearer token rejected");
            ApiError::Unauthenticated("Token is not valid")
        })?;

        let user = state
            .users
            .find_by_id(claims.sub)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token subject no longer exists");
                ApiError::Unauthenticated("Token is not valid")
            })?;

        Ok(CurrentUser(user))
    }
}
