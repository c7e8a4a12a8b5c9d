//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use super::storage::UserRecord;

/// Discriminator scoping an OTP to the flow that issued it.
///
/// Lookup and post-verification effects are both keyed on this: a
/// registration code cannot complete a login and vice versa.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    Registration,
    Login,
}

impl OtpPurpose {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Login => "login",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub society: Option<String>,
    pub flat: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub message: String,
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp_code: String,
    pub purpose: OtpPurpose,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyOtpResponse {
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub message: String,
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResendOtpRequest {
    pub email: String,
    pub purpose: OtpPurpose,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

/// Public projection returned after a successful verification.
/// Never carries the password hash or the verification flag.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub society: Option<String>,
    pub flat: Option<String>,
}

impl UserProfile {
    pub(super) fn from_record(record: &UserRecord) -> Self {
        Self {
            id: record.id.to_string(),
            username: record.username.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            society: record.society.clone(),
            flat: record.flat.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn purpose_serializes_lowercase() -> Result<()> {
        assert_eq!(
            serde_json::to_value(OtpPurpose::Registration)?,
            serde_json::json!("registration")
        );
        assert_eq!(
            serde_json::to_value(OtpPurpose::Login)?,
            serde_json::json!("login")
        );
        Ok(())
    }

    #[test]
    fn purpose_rejects_unknown_values() {
        let result: Result<OtpPurpose, _> = serde_json::from_value(serde_json::json!("reset"));
        assert!(result.is_err());
    }

    #[test]
    fn verify_request_round_trips() -> Result<()> {
        let value = serde_json::json!({
            "email": "alice@example.com",
            "otp_code": "042137",
            "purpose": "registration",
        });
        let request: VerifyOtpRequest = serde_json::from_value(value)?;
        assert_eq!(request.email, "alice@example.com");
        assert_eq!(request.otp_code, "042137");
        assert_eq!(request.purpose, OtpPurpose::Registration);
        Ok(())
    }

    #[test]
    fn register_request_optional_fields_default_to_none() -> Result<()> {
        let value = serde_json::json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "sup3rsecret",
            "confirm_password": "sup3rsecret",
        });
        let request: RegisterRequest = serde_json::from_value(value)?;
        assert!(request.phone.is_none());
        assert!(request.society.is_none());
        assert!(request.flat.is_none());
        Ok(())
    }
}
