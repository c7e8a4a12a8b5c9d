//! OTP issuance: generate a code, write the ledger, deliver the email.
//!
//! Delivery happens inside the issuing request. Callers decide what a
//! failed send means: registration rolls the whole account back, login and
//! resend surface the failure and leave the ledger row in place.

use sqlx::PgConnection;

use crate::api::email::{EmailMessage, EmailSender};

use super::error::AuthError;
use super::state::AuthConfig;
use super::storage::insert_otp;
use super::types::OtpPurpose;
use super::utils::generate_otp_code;
use uuid::Uuid;

pub(super) struct OtpRecipient<'a> {
    pub(super) user_id: Uuid,
    pub(super) username: &'a str,
    pub(super) email: &'a str,
}

/// Create a fresh ledger entry and synchronously deliver the code.
pub(super) async fn issue_otp(
    conn: &mut PgConnection,
    mailer: &dyn EmailSender,
    config: &AuthConfig,
    recipient: &OtpRecipient<'_>,
    purpose: OtpPurpose,
    resent: bool,
) -> Result<(), AuthError> {
    let code = generate_otp_code();
    insert_otp(conn, recipient.user_id, &code, purpose).await?;

    let message = compose_otp_email(recipient, &code, purpose, config.otp_ttl_minutes(), resent);
    mailer.send(&message).await.map_err(AuthError::Delivery)?;

    Ok(())
}

fn compose_otp_email(
    recipient: &OtpRecipient<'_>,
    code: &str,
    purpose: OtpPurpose,
    ttl_minutes: i64,
    resent: bool,
) -> EmailMessage {
    let username = recipient.username;
    let (subject, body) = if resent {
        let flow = match purpose {
            OtpPurpose::Registration => "Registration",
            OtpPurpose::Login => "Login",
        };
        (
            format!("Klayons - {flow} OTP (Resent)"),
            format!(
                "Hello {username},\n\n\
                 Your new {purpose} OTP is: {code}\n\n\
                 This OTP is valid for {ttl_minutes} minutes.\n\n\
                 Thank you,\nKlayons Team\n"
            ),
        )
    } else {
        match purpose {
            OtpPurpose::Registration => (
                "Klayons - Email Verification OTP".to_string(),
                format!(
                    "Welcome to Klayons!\n\n\
                     Your email verification OTP is: {code}\n\n\
                     This OTP is valid for {ttl_minutes} minutes.\n\n\
                     Thank you,\nKlayons Team\n"
                ),
            ),
            OtpPurpose::Login => (
                "Klayons - Login Verification OTP".to_string(),
                format!(
                    "Hello {username},\n\n\
                     Your login verification OTP is: {code}\n\n\
                     This OTP is valid for {ttl_minutes} minutes.\n\n\
                     If you didn't request this, please ignore this email.\n\n\
                     Thank you,\nKlayons Team\n"
                ),
            ),
        }
    };

    EmailMessage {
        to_email: recipient.email.to_string(),
        subject,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient() -> OtpRecipient<'static> {
        OtpRecipient {
            user_id: Uuid::nil(),
            username: "alice",
            email: "alice@example.com",
        }
    }

    #[test]
    fn registration_email_contains_code_and_ttl() {
        let message = compose_otp_email(&recipient(), "042137", OtpPurpose::Registration, 10, false);
        assert_eq!(message.to_email, "alice@example.com");
        assert_eq!(message.subject, "Klayons - Email Verification OTP");
        assert!(message.body.contains("042137"));
        assert!(message.body.contains("valid for 10 minutes"));
    }

    #[test]
    fn login_email_greets_the_user() {
        let message = compose_otp_email(&recipient(), "654321", OtpPurpose::Login, 10, false);
        assert_eq!(message.subject, "Klayons - Login Verification OTP");
        assert!(message.body.contains("Hello alice"));
        assert!(message.body.contains("654321"));
        assert!(message.body.contains("please ignore this email"));
    }

    #[test]
    fn resent_email_is_marked_as_resent() {
        let message = compose_otp_email(&recipient(), "000042", OtpPurpose::Login, 5, true);
        assert_eq!(message.subject, "Klayons - Login OTP (Resent)");
        assert!(message.body.contains("Your new login OTP is: 000042"));
        assert!(message.body.contains("valid for 5 minutes"));
    }
}
