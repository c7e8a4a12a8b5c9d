//! Outbound email delivery.
//!
//! OTP codes are delivered synchronously inside the request that triggers
//! them; callers surface delivery failures to the client instead of retrying.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Development sender: logs the message instead of delivering it.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            body = %message.body,
            "email send stub"
        );
        Ok(())
    }
}

/// SMTP relay sender used in production deployments.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a TLS relay transport with the given credentials.
    ///
    /// # Errors
    /// Returns an error if the relay host or from address is invalid.
    pub fn new(host: &str, username: String, password: &SecretString, from: &str) -> Result<Self> {
        let from = from
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid from address: {from}"))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .with_context(|| format!("Failed to configure SMTP relay: {host}"))?
            .credentials(Credentials::new(
                username,
                password.expose_secret().to_string(),
            ))
            .build();
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let to = message
            .to_email
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid recipient address: {}", message.to_email))?;
        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .context("Failed to build email message")?;

        self.transport
            .send(email)
            .await
            .context("Failed to deliver email")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            to_email: "alice@example.com".to_string(),
            subject: "Klayons - Email Verification OTP".to_string(),
            body: "Your email verification OTP is: 123456".to_string(),
        }
    }

    #[tokio::test]
    async fn log_sender_always_succeeds() {
        let sender = LogEmailSender;
        assert!(sender.send(&message()).await.is_ok());
    }

    #[test]
    fn smtp_mailer_rejects_invalid_from() {
        let password = SecretString::from("secret".to_string());
        let result = SmtpMailer::new("smtp.example.com", "user".to_string(), &password, "not-an-address");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn smtp_mailer_rejects_invalid_recipient() {
        let password = SecretString::from("secret".to_string());
        let mailer = SmtpMailer::new(
            "smtp.example.com",
            "user".to_string(),
            &password,
            "no-reply@example.com",
        )
        .expect("mailer");
        let mut bad = message();
        bad.to_email = "broken".to_string();
        assert!(mailer.send(&bad).await.is_err());
    }
}
