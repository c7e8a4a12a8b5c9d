//! Login gate: password check, verified-email check, then a login OTP.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::email::EmailSender;

use super::error::AuthError;
use super::otp::{OtpRecipient, issue_otp};
use super::state::AuthConfig;
use super::storage::lookup_user_by_email;
use super::types::{LoginRequest, LoginResponse, OtpPurpose};
use super::utils::{normalize_email, verify_password};

/// Validate credentials and dispatch a login OTP.
///
/// Login is deliberately two-step: even with a correct password the caller
/// still has to verify a fresh code from their inbox.
#[utoipa::path(
    post,
    path = "/api/auth/login/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials valid, OTP sent", body = LoginResponse),
        (status = 400, description = "Invalid credentials or unverified email", body = super::error::ErrorResponse),
        (status = 500, description = "OTP delivery failed", body = super::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    mailer: Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    let email = normalize_email(&request.email);

    // Unknown accounts and wrong passwords are indistinguishable to the
    // caller.
    let user = lookup_user_by_email(&pool, &email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    if !verify_password(&user.password_hash, &request.password) {
        return Err(AuthError::InvalidCredentials);
    }

    // Accounts that never completed registration cannot authenticate.
    if !user.email_verified {
        return Err(AuthError::EmailNotVerified);
    }

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
        OtpPurpose::Login,
        false,
    )
    .await?;

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            message: "Credentials verified. OTP sent to your email.".to_string(),
            email: user.email,
        }),
    ))
}
