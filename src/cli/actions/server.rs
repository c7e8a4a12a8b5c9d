use crate::api::{
    self,
    email::{EmailSender, LogEmailSender, SmtpMailer},
    handlers::auth::AuthConfig,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub otp_ttl_seconds: i64,
    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<SecretString>,
    pub smtp_from: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the SMTP relay is misconfigured or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new().with_otp_ttl_seconds(args.otp_ttl_seconds);

    let mailer: Arc<dyn EmailSender> =
        match (args.smtp_host, args.smtp_username, args.smtp_password) {
            (Some(host), Some(username), Some(password)) => Arc::new(
                SmtpMailer::new(&host, username, &password, &args.smtp_from)
                    .context("Failed to configure SMTP relay")?,
            ),
            _ => {
                info!("No SMTP relay configured; OTP emails will be logged instead of delivered");
                Arc::new(LogEmailSender)
            }
        };

    api::new(args.port, args.dsn, auth_config, mailer).await
}
