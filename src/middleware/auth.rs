use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::db::queries;
use crate::error::AppError;
use crate::AppState;

/// Caller identity, resolved from the `Authorization: Bearer <api-key>`
/// header against the `api_keys` table. Identity management itself lives
/// outside this service; this only maps a presented key to a user id.
#[derive(Debug, Clone, Copy)]
pub struct AuthedUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing API key".to_string()))?;

        let key = header.strip_prefix("Bearer ").unwrap_or(header);

        match queries::resolve_api_key(&state.db, key).await? {
            Some(user_id) => Ok(AuthedUser(user_id)),
            None => Err(AppError::Unauthorized("Invalid API key".to_string())),
        }
    }
}
