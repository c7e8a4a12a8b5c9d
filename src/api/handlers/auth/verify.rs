//! OTP verification: the state transition at the heart of both flows.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;

use super::error::AuthError;
use super::state::AuthConfig;
use super::storage::{
    find_latest_otp, get_or_create_token, lookup_user_by_email, mark_email_verified,
    mark_otp_verified,
};
use super::types::{OtpPurpose, UserProfile, VerifyOtpRequest, VerifyOtpResponse};
use super::utils::{normalize_email, otp_expired};
use std::sync::Arc;

/// Check a submitted code against the ledger and exchange it for a token.
///
/// The newest matching record wins. Expiry is checked before anything else
/// succeeds; expired records stay in the ledger, they are simply unusable.
/// Re-submitting a still-valid code is idempotent: it re-marks the record and
/// returns the same token.
#[utoipa::path(
    post,
    path = "/api/auth/verify-otp/",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code accepted, token issued", body = VerifyOtpResponse),
        (status = 400, description = "Invalid or expired code", body = super::error::ErrorResponse),
        (status = 404, description = "Unknown email", body = super::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    let code = request.otp_code.trim();
    if code.is_empty() {
        return Err(AuthError::Validation("Missing OTP code".to_string()));
    }

    let email = normalize_email(&request.email);
    let user = lookup_user_by_email(&pool, &email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let record = find_latest_otp(&pool, user.id, code, request.purpose)
        .await?
        .ok_or(AuthError::InvalidCode)?;

    if otp_expired(record.created_at, config.otp_ttl_seconds()) {
        // The record is left as-is; it can never verify again anyway.
        return Err(AuthError::Expired);
    }

    if !record.verified {
        mark_otp_verified(&pool, record.id).await?;
    }

    if request.purpose == OtpPurpose::Registration {
        mark_email_verified(&pool, user.id).await?;
    }

    let token = get_or_create_token(&pool, user.id).await?;

    let message = match request.purpose {
        OtpPurpose::Registration => "Email verified successfully! Registration complete.",
        OtpPurpose::Login => "Login successful!",
    };

    Ok((
        StatusCode::OK,
        Json(VerifyOtpResponse {
            message: message.to_string(),
            token,
            user: UserProfile::from_record(&user),
        }),
    ))
}
