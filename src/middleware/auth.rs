use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use mongodb::bson::doc;

use crate::error::AppError;
use crate::services::CurrentUser;
use crate::startup::AppState;

/// The authentication resolver as an extractor: pulls the bearer credential,
/// verifies signature and expiry against the process-wide secret, and looks
/// up the identity it encodes. Every failure mode (missing header, malformed
/// token, bad signature, expiry, deleted identity) yields the identical
/// Unauthorized message so callers cannot distinguish them.
pub struct AuthUser(pub CurrentUser);

fn not_authorized() -> AppError {
    AppError::Unauthorized(anyhow::anyhow!("Not authorized to access this route"))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(not_authorized)?;

        let claims = state
            .jwt
            .validate_token(token)
            .map_err(|_| not_authorized())?;

        let user = state
            .db
            .users()
            .find_one(doc! { "_id": &claims.sub }, None)
            .await
            .map_err(AppError::from)?
            .ok_or_else(not_authorized)?;

        tracing::Span::current().record("user_id", user.id.as_str());

        Ok(AuthUser(CurrentUser {
            id: user.id,
            role: user.role,
        }))
    }
}
