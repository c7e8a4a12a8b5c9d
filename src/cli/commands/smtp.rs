use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SMTP_HOST: &str = "smtp-host";
pub const ARG_SMTP_USERNAME: &str = "smtp-username";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";
pub const ARG_SMTP_FROM: &str = "smtp-from";

/// SMTP relay settings. When no host is configured the server falls back to
/// logging outbound mail instead of delivering it.
#[derive(Debug, Clone)]
pub struct Options {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub from: String,
}

impl Options {
    /// Parse SMTP arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a host is set without credentials.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // Filter empty strings which clap might pass through if env vars are set to ""
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|value| !value.trim().is_empty())
        };

        let host = get_non_empty(ARG_SMTP_HOST);
        let username = get_non_empty(ARG_SMTP_USERNAME);
        let password = get_non_empty(ARG_SMTP_PASSWORD).map(SecretString::from);

        if host.is_some() && (username.is_none() || password.is_none()) {
            anyhow::bail!(
                "--{ARG_SMTP_USERNAME} and --{ARG_SMTP_PASSWORD} are required when --{ARG_SMTP_HOST} is set"
            );
        }

        let from = matches
            .get_one::<String>(ARG_SMTP_FROM)
            .cloned()
            .unwrap_or_else(|| "no-reply@klayons.dev".to_string());

        Ok(Self {
            host,
            username,
            password,
            from,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_HOST)
                .long(ARG_SMTP_HOST)
                .help("SMTP relay host used to deliver OTP emails")
                .long_help(
                    "SMTP relay host used to deliver OTP emails.\n\nWhen unset, outbound mail is logged instead of delivered (development mode).",
                )
                .env("KLAYONS_SMTP_HOST"),
        )
        .arg(
            Arg::new(ARG_SMTP_USERNAME)
                .long(ARG_SMTP_USERNAME)
                .help("SMTP relay username")
                .env("KLAYONS_SMTP_USERNAME"),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP relay password")
                .env("KLAYONS_SMTP_PASSWORD"),
        )
        .arg(
            Arg::new(ARG_SMTP_FROM)
                .long(ARG_SMTP_FROM)
                .help("From address for outbound OTP emails")
                .env("KLAYONS_SMTP_FROM")
                .default_value("no-reply@klayons.dev"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches_from(args: Vec<&str>) -> ArgMatches {
        let command = with_args(Command::new("test"));
        command.get_matches_from(args)
    }

    fn clear_smtp_env<T>(test: impl FnOnce() -> T) -> T {
        temp_env::with_vars(
            [
                ("KLAYONS_SMTP_HOST", None::<&str>),
                ("KLAYONS_SMTP_USERNAME", None),
                ("KLAYONS_SMTP_PASSWORD", None),
                ("KLAYONS_SMTP_FROM", None),
            ],
            test,
        )
    }

    #[test]
    fn test_defaults_to_log_mode() {
        let options = clear_smtp_env(|| {
            let matches = matches_from(vec!["test"]);
            Options::parse(&matches).expect("options")
        });
        assert!(options.host.is_none());
        assert_eq!(options.from, "no-reply@klayons.dev");
    }

    #[test]
    fn test_host_requires_credentials() {
        let result = clear_smtp_env(|| {
            let matches = matches_from(vec!["test", "--smtp-host", "smtp.example.com"]);
            Options::parse(&matches)
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_full_relay_config() {
        let options = clear_smtp_env(|| {
            let matches = matches_from(vec![
                "test",
                "--smtp-host",
                "smtp.example.com",
                "--smtp-username",
                "mailer",
                "--smtp-password",
                "hunter2",
                "--smtp-from",
                "accounts@example.com",
            ]);
            Options::parse(&matches).expect("options")
        });
        assert_eq!(options.host.as_deref(), Some("smtp.example.com"));
        assert_eq!(options.username.as_deref(), Some("mailer"));
        assert!(options.password.is_some());
        assert_eq!(options.from, "accounts@example.com");
    }
}
