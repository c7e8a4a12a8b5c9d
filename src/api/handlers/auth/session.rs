//! Bearer-token session handling and logout.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use sqlx::PgPool;

use super::error::AuthError;
use super::storage::{SessionRecord, delete_token, lookup_session};
use super::types::MessageResponse;

/// Pull the opaque token out of an `Authorization: Bearer ...` header.
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Resolve a presented bearer token into an account, if the token is live.
pub(crate) async fn authenticate_session(
    headers: &HeaderMap,
    pool: &PgPool,
) -> Result<Option<SessionRecord>, AuthError> {
    let Some(token) = extract_bearer_token(headers) else {
        return Ok(None);
    };
    let record = lookup_session(pool, &token).await?;
    Ok(record)
}

/// Delete the caller's token. The next authenticated call fails until a new
/// login cycle mints a fresh token.
#[utoipa::path(
    post,
    path = "/api/auth/logout/",
    responses(
        (status = 200, description = "Token deleted", body = MessageResponse),
        (status = 400, description = "Presented token has no session", body = super::error::ErrorResponse),
        (status = 401, description = "Missing bearer token", body = super::error::ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(token) = extract_bearer_token(&headers) else {
        return Err(AuthError::Unauthenticated);
    };

    let record = lookup_session(&pool, &token)
        .await?
        .ok_or(AuthError::TokenNotFound)?;

    if !delete_token(&pool, record.user_id).await? {
        // Lost a race with a concurrent logout.
        return Err(AuthError::TokenNotFound);
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}
