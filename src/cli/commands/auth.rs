use clap::{Arg, ArgMatches, Command};

pub const ARG_OTP_TTL_SECONDS: &str = "otp-ttl-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub otp_ttl_seconds: i64,
}

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the TTL is not positive.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let otp_ttl_seconds = matches
            .get_one::<i64>(ARG_OTP_TTL_SECONDS)
            .copied()
            .unwrap_or(600);
        if otp_ttl_seconds <= 0 {
            anyhow::bail!("--{ARG_OTP_TTL_SECONDS} must be positive");
        }
        Ok(Self { otp_ttl_seconds })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_OTP_TTL_SECONDS)
            .long(ARG_OTP_TTL_SECONDS)
            .help("OTP validity window in seconds")
            .env("KLAYONS_OTP_TTL_SECONDS")
            .default_value("600")
            .value_parser(clap::value_parser!(i64)),
    )
}
