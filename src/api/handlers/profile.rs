//! Authenticated profile endpoint.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::error::AuthError;
use super::auth::principal::require_auth;

/// Self-view of the account; unlike the post-verification projection this
/// one includes the verification flag.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ProfileUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub society: Option<String>,
    pub flat: Option<String>,
    pub email_verified: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ProfileResponse {
    pub user: ProfileUser,
}

/// Return the authenticated account's profile.
#[utoipa::path(
    get,
    path = "/api/auth/profile/",
    responses(
        (status = 200, description = "Authenticated profile", body = ProfileResponse),
        (status = 401, description = "Missing or invalid bearer token", body = super::auth::error::ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "auth"
)]
pub async fn profile(
    headers: HeaderMap,
    pool: Extension<PgPool>,
) -> Result<impl IntoResponse, AuthError> {
    let principal = require_auth(&headers, &pool).await?;

    let user = fetch_profile(&pool, principal.user_id)
        .await
        .map_err(|err| AuthError::Internal(err.into()))?
        .ok_or(AuthError::UserNotFound)?;

    Ok((StatusCode::OK, Json(ProfileResponse { user })))
}

async fn fetch_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<ProfileUser>, sqlx::Error> {
    let query = r"
        SELECT id::text AS id, username, email, phone, society, flat, email_verified
        FROM users
        WHERE id = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    Ok(row.map(|row| ProfileUser {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        phone: row.get("phone"),
        society: row.get("society"),
        flat: row.get("flat"),
        email_verified: row.get("email_verified"),
    }))
}
