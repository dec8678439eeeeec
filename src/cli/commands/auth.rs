use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

/// Identity provider options parsed from CLI arguments.
#[derive(Debug)]
pub struct Options {
    pub identity_url: String,
    pub session_cookie: String,
    pub identity_timeout_seconds: u64,
}

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("identity-url")
                .long("identity-url")
                .help("Base URL of the identity provider service")
                .env("SPECIMEN_IDENTITY_URL")
                .default_value("http://localhost:3001"),
        )
        .arg(
            Arg::new("session-cookie")
                .long("session-cookie")
                .help("Name of the session cookie issued by the identity provider")
                .env("SPECIMEN_SESSION_COOKIE")
                .default_value("specimen.session_token"),
        )
        .arg(
            Arg::new("identity-timeout-seconds")
                .long("identity-timeout-seconds")
                .help("Request timeout for identity provider calls")
                .env("SPECIMEN_IDENTITY_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64)),
        )
}

impl Options {
    /// Extract identity provider options from validated matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is somehow missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            identity_url: matches
                .get_one::<String>("identity-url")
                .cloned()
                .context("missing required argument: --identity-url")?,
            session_cookie: matches
                .get_one::<String>("session-cookie")
                .cloned()
                .context("missing required argument: --session-cookie")?,
            identity_timeout_seconds: matches
                .get_one::<u64>("identity-timeout-seconds")
                .copied()
                .context("missing required argument: --identity-timeout-seconds")?,
        })
    }
}
