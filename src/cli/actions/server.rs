use crate::gateway::{self, GatewayConfig};
use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::debug;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub host: String,
    pub port: u16,
    pub user_pool_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub region: String,
    pub identity_endpoint: Option<Url>,
    pub session_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub cookie_secure: bool,
    pub debug: bool,
}

impl Args {
    /// Turn CLI arguments into the gateway configuration.
    ///
    /// # Errors
    /// Returns an error if the session signing secret is missing or too short.
    pub fn into_config(self) -> Result<GatewayConfig> {
        let config = GatewayConfig::new(self.session_secret)
            .context("Invalid session configuration")?
            .with_host(self.host)
            .with_port(self.port)
            .with_user_pool_id(self.user_pool_id)
            .with_client_id(self.client_id)
            .with_client_secret(self.client_secret)
            .with_region(self.region)
            .with_identity_endpoint(self.identity_endpoint)
            .with_session_ttl_seconds(self.session_ttl_seconds)
            .with_cookie_secure(self.cookie_secure)
            .with_debug(self.debug);

        Ok(config)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = args.into_config()?;

    debug!("Gateway config: {:?}", config);

    gateway::new(config).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(secret: &str) -> Args {
        Args {
            host: "127.0.0.1".to_string(),
            port: 8001,
            user_pool_id: Some("us-east-1_pool".to_string()),
            client_id: Some("client-id".to_string()),
            client_secret: None,
            region: "us-east-1".to_string(),
            identity_endpoint: None,
            session_secret: SecretString::from(secret.to_string()),
            session_ttl_seconds: 60,
            cookie_secure: true,
            debug: true,
        }
    }

    #[test]
    fn into_config_carries_every_field() {
        let config = args("0123456789abcdef0123456789abcdef")
            .into_config()
            .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8001");
        assert_eq!(config.user_pool_id(), Some("us-east-1_pool"));
        assert_eq!(config.client_id(), Some("client-id"));
        assert!(config.debug());
        assert!(config.cookie_settings().secure);
        assert_eq!(config.cookie_settings().max_age_seconds, 60);
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn weak_session_secret_fails_startup() {
        let err = args("dev-secret-key").into_config().unwrap_err();
        assert!(format!("{err:#}").contains("at least 32 bytes"));
    }
}
