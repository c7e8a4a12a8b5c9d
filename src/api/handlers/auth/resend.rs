//! Resend: invalidate earlier codes, then issue a fresh one.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;

use crate::api::email::EmailSender;

use super::error::AuthError;
use super::otp::{OtpRecipient, issue_otp};
use super::state::AuthConfig;
use super::storage::{delete_unverified_otps, lookup_user_by_email};
use super::types::{MessageResponse, ResendOtpRequest};
use super::utils::normalize_email;

/// Invalidate all live codes for the purpose and email a new one.
///
/// After a resend at most one code can still verify; earlier unverified
/// records are deleted before the fresh issue.
#[utoipa::path(
    post,
    path = "/api/auth/resend-otp/",
    request_body = ResendOtpRequest,
    responses(
        (status = 200, description = "New OTP sent", body = MessageResponse),
        (status = 404, description = "Unknown email", body = super::error::ErrorResponse),
        (status = 500, description = "OTP delivery failed", body = super::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn resend_otp(
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    mailer: Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<ResendOtpRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    let email = normalize_email(&request.email);
    let user = lookup_user_by_email(&pool, &email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let purged = delete_unverified_otps(&pool, user.id, request.purpose).await?;
    debug!(
        user_id = %user.id,
        purpose = %request.purpose,
        purged,
        "invalidated previous OTP records"
    );

    let mut conn = pool
        .acquire()
        .await
        .map_err(|err| AuthError::Internal(err.into()))?;
    let recipient = OtpRecipient {
        user_id: user.id,
        username: &user.username,
        email: &user.email,
    };
    issue_otp(
        &mut *conn,
        mailer.as_ref(),
        &config,
        &recipient,
        request.purpose,
        true,
    )
    .await?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "New OTP sent to your email.".to_string(),
        }),
    ))
}
