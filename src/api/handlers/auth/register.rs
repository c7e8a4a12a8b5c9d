//! Registration: create the account and send the first verification code.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::email::EmailSender;

use super::error::AuthError;
use super::otp::{OtpRecipient, issue_otp};
use super::state::AuthConfig;
use super::storage::{NewUser, SignupOutcome, insert_user};
use super::types::{OtpPurpose, RegisterRequest, RegisterResponse};
use super::utils::{hash_password, normalize_email, valid_email};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Register a new account and email its first OTP.
#[utoipa::path(
    post,
    path = "/api/auth/register/",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, OTP sent", body = RegisterResponse),
        (status = 400, description = "Validation failure (duplicate email, password mismatch, ...)", body = super::error::ErrorResponse),
        (status = 500, description = "OTP delivery failed; account rolled back", body = super::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    mailer: Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    let username = request.username.trim();
    if username.is_empty() {
        return Err(AuthError::Validation("Username is required".to_string()));
    }

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }

    if request.password != request.confirm_password {
        return Err(AuthError::Validation("Passwords don't match".to_string()));
    }
    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let password_hash = hash_password(&request.password)?;

    // Account, ledger row, and delivery succeed or fail together: the
    // transaction only commits after the send, so a delivery failure leaves
    // no orphaned unverifiable account behind.
    let mut tx = pool
        .begin()
        .await
        .map_err(|err| AuthError::Internal(err.into()))?;

    let new_user = NewUser {
        username,
        email: &email,
        password_hash: &password_hash,
        phone: request.phone.as_deref(),
        society: request.society.as_deref(),
        flat: request.flat.as_deref(),
    };
    let user_id = match insert_user(&mut *tx, &new_user).await? {
        SignupOutcome::Created(user_id) => user_id,
        SignupOutcome::DuplicateEmail => {
            let _ = tx.rollback().await;
            return Err(AuthError::Validation("Email already exists".to_string()));
        }
    };

    let recipient = OtpRecipient {
        user_id,
        username,
        email: &email,
    };
    if let Err(err) = issue_otp(
        &mut *tx,
        mailer.as_ref(),
        &config,
        &recipient,
        OtpPurpose::Registration,
        false,
    )
    .await
    {
        let _ = tx.rollback().await;
        return Err(err);
    }

    tx.commit()
        .await
        .map_err(|err| AuthError::Internal(err.into()))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful. OTP sent to your email.".to_string(),
            email,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;
    use axum::http::StatusCode;
    use sqlx::postgres::PgPoolOptions;

    fn extensions() -> (
        Extension<PgPool>,
        Extension<Arc<AuthConfig>>,
        Extension<Arc<dyn EmailSender>>,
    ) {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool");
        let mailer: Arc<dyn EmailSender> = Arc::new(LogEmailSender);
        (
            Extension(pool),
            Extension(Arc::new(AuthConfig::new())),
            Extension(mailer),
        )
    }

    fn request(password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            phone: None,
            society: None,
            flat: None,
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[tokio::test]
    async fn missing_payload_is_rejected() {
        let (pool, config, mailer) = extensions();
        let err = register(pool, config, mailer, None)
            .await
            .err()
            .expect("error");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn password_mismatch_is_rejected() {
        let (pool, config, mailer) = extensions();
        let err = register(
            pool,
            config,
            mailer,
            Some(Json(request("sup3rsecret", "different"))),
        )
        .await
        .err()
        .expect("error");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Passwords don't match");
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let (pool, config, mailer) = extensions();
        let err = register(pool, config, mailer, Some(Json(request("short", "short"))))
            .await
            .err()
            .expect("error");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let (pool, config, mailer) = extensions();
        let mut invalid = request("sup3rsecret", "sup3rsecret");
        invalid.email = "not-an-email".to_string();
        let err = register(pool, config, mailer, Some(Json(invalid)))
            .await
            .err()
            .expect("error");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid email address");
    }

    #[tokio::test]
    async fn blank_username_is_rejected() {
        let (pool, config, mailer) = extensions();
        let mut invalid = request("sup3rsecret", "sup3rsecret");
        invalid.username = "   ".to_string();
        let err = register(pool, config, mailer, Some(Json(invalid)))
            .await
            .err()
            .expect("error");
        assert_eq!(err.to_string(), "Username is required");
    }
}
