//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{auth, smtp};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;
    let smtp_opts = smtp::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        otp_ttl_seconds: auth_opts.otp_ttl_seconds,
        smtp_host: smtp_opts.host,
        smtp_username: smtp_opts.username,
        smtp_password: smtp_opts.password,
        smtp_from: smtp_opts.from,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    fn clear_env<T>(test: impl FnOnce() -> T) -> T {
        temp_env::with_vars(
            [
                ("KLAYONS_PORT", None::<&str>),
                ("KLAYONS_DSN", None),
                ("KLAYONS_OTP_TTL_SECONDS", None),
                ("KLAYONS_SMTP_HOST", None),
                ("KLAYONS_SMTP_USERNAME", None),
                ("KLAYONS_SMTP_PASSWORD", None),
                ("KLAYONS_SMTP_FROM", None),
            ],
            test,
        )
    }

    #[test]
    fn server_action_from_minimal_args() {
        clear_env(|| {
            let matches = commands::new().get_matches_from(vec![
                "klayons",
                "--dsn",
                "postgres://localhost/klayons",
            ]);
            let action = handler(&matches).expect("action");
            let Action::Server(args) = action;
            assert_eq!(args.port, 8080);
            assert_eq!(args.dsn, "postgres://localhost/klayons");
            assert_eq!(args.otp_ttl_seconds, 600);
            assert!(args.smtp_host.is_none());
        });
    }

    #[test]
    fn server_action_reads_env() {
        temp_env::with_vars(
            [
                ("KLAYONS_PORT", Some("9000")),
                ("KLAYONS_DSN", Some("postgres://db.internal/klayons")),
                ("KLAYONS_OTP_TTL_SECONDS", Some("300")),
                ("KLAYONS_SMTP_HOST", None),
                ("KLAYONS_SMTP_USERNAME", None),
                ("KLAYONS_SMTP_PASSWORD", None),
                ("KLAYONS_SMTP_FROM", None),
            ],
            || {
                let matches = commands::new().get_matches_from(vec!["klayons"]);
                let action = handler(&matches).expect("action");
                let Action::Server(args) = action;
                assert_eq!(args.port, 9000);
                assert_eq!(args.dsn, "postgres://db.internal/klayons");
                assert_eq!(args.otp_ttl_seconds, 300);
            },
        );
    }
}
