//! Authenticated principal extraction.
//!
//! Handlers behind authentication resolve the bearer token to a principal up
//! front and receive it explicitly; there is no ambient request state.

use axum::http::HeaderMap;
use sqlx::PgPool;
use uuid::Uuid;

use super::error::AuthError;
use super::session::authenticate_session;

/// Authenticated account context derived from the bearer token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
}

/// Resolve the bearer token into a principal, or fail with 401.
pub async fn require_auth(headers: &HeaderMap, pool: &PgPool) -> Result<Principal, AuthError> {
    match authenticate_session(headers, pool).await? {
        Some(record) => Ok(Principal {
            user_id: record.user_id,
            email: record.email,
        }),
        None => Err(AuthError::Unauthenticated),
    }
}
