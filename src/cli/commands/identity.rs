use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use url::Url;

pub const ARG_USER_POOL_ID: &str = "user-pool-id";
pub const ARG_CLIENT_ID: &str = "client-id";
pub const ARG_CLIENT_SECRET: &str = "client-secret";
pub const ARG_REGION: &str = "region";
pub const ARG_IDENTITY_ENDPOINT: &str = "identity-endpoint";

#[derive(Debug)]
pub struct Options {
    pub user_pool_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub region: String,
    pub endpoint: Option<Url>,
}

impl Options {
    /// # Errors
    /// Returns an error if the identity endpoint is not a valid URL.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let endpoint = matches
            .get_one::<String>(ARG_IDENTITY_ENDPOINT)
            .map(|url| Url::parse(url).with_context(|| format!("invalid COGNITO_ENDPOINT: {url}")))
            .transpose()?;

        Ok(Self {
            user_pool_id: matches.get_one::<String>(ARG_USER_POOL_ID).cloned(),
            client_id: matches.get_one::<String>(ARG_CLIENT_ID).cloned(),
            client_secret: matches
                .get_one::<String>(ARG_CLIENT_SECRET)
                .cloned()
                .map(SecretString::from),
            region: matches
                .get_one::<String>(ARG_REGION)
                .cloned()
                .unwrap_or_else(|| crate::gateway::config::DEFAULT_REGION.to_string()),
            endpoint,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_USER_POOL_ID)
                .long(ARG_USER_POOL_ID)
                .help("Cognito user pool id")
                .env("COGNITO_USER_POOL_ID"),
        )
        .arg(
            Arg::new(ARG_CLIENT_ID)
                .long(ARG_CLIENT_ID)
                .help("Cognito app client id")
                .env("COGNITO_CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_CLIENT_SECRET)
                .long(ARG_CLIENT_SECRET)
                .help("Cognito app client secret, enables SECRET_HASH")
                .env("COGNITO_CLIENT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_REGION)
                .long(ARG_REGION)
                .help("AWS region of the user pool")
                .env("AWS_REGION")
                .default_value(crate::gateway::config::DEFAULT_REGION),
        )
        .arg(
            Arg::new(ARG_IDENTITY_ENDPOINT)
                .long(ARG_IDENTITY_ENDPOINT)
                .help("Override the identity service endpoint, example: http://localhost:9229/")
                .env("COGNITO_ENDPOINT"),
        )
}
