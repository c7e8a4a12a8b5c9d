//! Domain errors for the auth flows and their HTTP mapping.
//!
//! Every failure a client can cause is converted to `{"error": "..."}` JSON
//! with an explicit status code at the request boundary; nothing propagates as
//! an opaque failure.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Email not verified")]
    EmailNotVerified,
    #[error("Invalid OTP")]
    InvalidCode,
    #[error("OTP has expired")]
    Expired,
    #[error("User not found")]
    UserNotFound,
    #[error("Token not found")]
    TokenNotFound,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Failed to send OTP email. Please try again.")]
    Delivery(#[source] anyhow::Error),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::InvalidCredentials
            | Self::EmailNotVerified
            | Self::InvalidCode
            | Self::Expired
            | Self::TokenNotFound => StatusCode::BAD_REQUEST,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Delivery(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            Self::Delivery(source) => error!("OTP delivery failed: {source}"),
            Self::Internal(source) => error!("Internal error: {source}"),
            _ => {}
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn status_mapping_matches_taxonomy() {
        assert_eq!(
            AuthError::Validation("Passwords don't match".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::EmailNotVerified.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::InvalidCode.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::Expired.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::TokenNotFound.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::Unauthenticated.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Delivery(anyhow!("smtp down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::Internal(anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = AuthError::Internal(anyhow!("connection refused to 10.0.0.7"));
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn client_errors_keep_their_messages() {
        assert_eq!(AuthError::InvalidCode.to_string(), "Invalid OTP");
        assert_eq!(AuthError::Expired.to_string(), "OTP has expired");
        assert_eq!(AuthError::UserNotFound.to_string(), "User not found");
    }

    #[tokio::test]
    async fn response_body_is_error_json() {
        let response = AuthError::InvalidCode.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: ErrorResponse = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body.error, "Invalid OTP");
    }
}
