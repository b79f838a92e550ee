//! Gateway configuration, built once at startup and shared read-only.

use crate::identity::{secret_hash, CognitoClient};
use anyhow::{bail, Context, Result};
use axum_extra::extract::cookie::Key;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use std::fmt;
use url::Url;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 12 * 60 * 60;
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Attributes applied to every session cookie.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age_seconds: i64,
}

#[derive(Clone)]
pub struct GatewayConfig {
    host: String,
    port: u16,
    user_pool_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    region: String,
    identity_endpoint: Option<Url>,
    session_secret: SecretString,
    session_ttl_seconds: i64,
    cookie_secure: bool,
    debug: bool,
}

impl GatewayConfig {
    /// Create a configuration with defaults around the session signing secret.
    ///
    /// # Errors
    /// Returns an error if the signing secret is empty or shorter than
    /// [`MIN_SESSION_SECRET_LEN`] bytes.
    pub fn new(session_secret: SecretString) -> Result<Self> {
        let len = session_secret.expose_secret().len();
        if len == 0 {
            bail!("session signing secret is required");
        }
        if len < MIN_SESSION_SECRET_LEN {
            bail!(
                "session signing secret must be at least {MIN_SESSION_SECRET_LEN} bytes, got {len}"
            );
        }

        Ok(Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user_pool_id: None,
            client_id: None,
            client_secret: None,
            region: DEFAULT_REGION.to_string(),
            identity_endpoint: None,
            session_secret,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            cookie_secure: false,
            debug: false,
        })
    }

    #[must_use]
    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_user_pool_id(mut self, user_pool_id: Option<String>) -> Self {
        self.user_pool_id = user_pool_id.filter(|id| !id.is_empty());
        self
    }

    #[must_use]
    pub fn with_client_id(mut self, client_id: Option<String>) -> Self {
        self.client_id = client_id.filter(|id| !id.is_empty());
        self
    }

    #[must_use]
    pub fn with_client_secret(mut self, client_secret: Option<SecretString>) -> Self {
        self.client_secret = client_secret.filter(|secret| !secret.expose_secret().is_empty());
        self
    }

    #[must_use]
    pub fn with_region(mut self, region: String) -> Self {
        self.region = region;
        self
    }

    #[must_use]
    pub fn with_identity_endpoint(mut self, endpoint: Option<Url>) -> Self {
        self.identity_endpoint = endpoint;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, bracketing IPv6 literals.
    #[must_use]
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    #[must_use]
    pub fn user_pool_id(&self) -> Option<&str> {
        self.user_pool_id.as_deref()
    }

    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Explicit endpoint if configured, otherwise the regional Cognito endpoint.
    ///
    /// # Errors
    /// Returns an error if the region cannot form a valid endpoint URL.
    pub fn identity_endpoint(&self) -> Result<Url> {
        match &self.identity_endpoint {
            Some(endpoint) => Ok(endpoint.clone()),
            None => CognitoClient::regional_endpoint(&self.region)
                .with_context(|| format!("Invalid region: {}", self.region)),
        }
    }

    #[must_use]
    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            secure: self.cookie_secure,
            max_age_seconds: self.session_ttl_seconds,
        }
    }

    /// Signing key for the session cookies. The secret is stretched to the
    /// 64 bytes the cookie signer expects.
    #[must_use]
    pub fn cookie_key(&self) -> Key {
        let digest = Sha512::digest(self.session_secret.expose_secret().as_bytes());
        Key::from(digest.as_slice())
    }

    /// Authentication tag for `username`, present only when a client secret
    /// is configured.
    #[must_use]
    pub fn secret_hash(&self, username: &str) -> Option<String> {
        let secret = self.client_secret.as_ref()?;
        let client_id = self.client_id.as_deref().unwrap_or_default();
        Some(secret_hash(username, client_id, secret.expose_secret()))
    }

    /// Non-fatal configuration problems worth a startup warning.
    #[must_use]
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.user_pool_id.is_none() || self.client_id.is_none() {
            warnings.push("COGNITO_USER_POOL_ID and COGNITO_CLIENT_ID must be set");
        }
        if self.client_secret.is_some() && self.client_id.is_none() {
            warnings.push("COGNITO_CLIENT_SECRET is set without COGNITO_CLIENT_ID");
        }
        warnings
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user_pool_id", &self.user_pool_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("region", &self.region)
            .field("identity_endpoint", &self.identity_endpoint)
            .field("session_secret", &"***")
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("cookie_secure", &self.cookie_secure)
            .field("debug", &self.debug)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn config() -> GatewayConfig {
        GatewayConfig::new(SecretString::from(SECRET.to_string())).unwrap()
    }

    #[test]
    fn rejects_missing_session_secret() {
        let err = GatewayConfig::new(SecretString::from(String::new())).unwrap_err();
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn rejects_short_session_secret() {
        let err = GatewayConfig::new(SecretString::from("short".to_string())).unwrap_err();
        assert!(err.to_string().contains("at least 32 bytes"));
    }

    #[test]
    fn defaults() {
        let config = config();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.region(), "us-east-1");
        assert!(!config.debug());
        assert_eq!(
            config.cookie_settings(),
            CookieSettings {
                secure: false,
                max_age_seconds: DEFAULT_SESSION_TTL_SECONDS,
            }
        );
        assert_eq!(
            config.identity_endpoint().unwrap().as_str(),
            "https://cognito-idp.us-east-1.amazonaws.com/"
        );
    }

    #[test]
    fn bind_address_brackets_ipv6() {
        let config = config().with_host("::".to_string()).with_port(9000);
        assert_eq!(config.bind_address(), "[::]:9000");
    }

    #[test]
    fn explicit_endpoint_wins_over_region() {
        let endpoint = Url::parse("http://localhost:9229/").unwrap();
        let config = config()
            .with_region("eu-central-1".to_string())
            .with_identity_endpoint(Some(endpoint.clone()));
        assert_eq!(config.identity_endpoint().unwrap(), endpoint);
    }

    #[test]
    fn warns_about_missing_identifiers() {
        assert_eq!(config().warnings().len(), 1);

        let config = config()
            .with_user_pool_id(Some("us-east-1_pool".to_string()))
            .with_client_id(Some("client".to_string()));
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn empty_identifiers_count_as_missing() {
        let config = config()
            .with_user_pool_id(Some(String::new()))
            .with_client_id(Some(String::new()));
        assert!(config.user_pool_id().is_none());
        assert!(config.client_id().is_none());
        assert!(!config.warnings().is_empty());
    }

    #[test]
    fn secret_hash_only_with_client_secret() {
        let config = config().with_client_id(Some("client-id".to_string()));
        assert_eq!(config.secret_hash("alice@example.com"), None);

        let config = config.with_client_secret(Some(SecretString::from(
            "client-secret".to_string(),
        )));
        assert_eq!(
            config.secret_hash("alice@example.com").as_deref(),
            Some("sdWYXbCR79nQTSGLjdIIScXPRoMoiaj0trWzF8kEGXg=")
        );
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = config().with_client_secret(Some(SecretString::from(
            "client-secret".to_string(),
        )));
        let debug = format!("{config:?}");
        assert!(!debug.contains(SECRET));
        assert!(!debug.contains("client-secret"));
    }

    #[test]
    fn cookie_key_is_stable_per_secret() {
        let first = config().cookie_key();
        let second = config().cookie_key();
        assert_eq!(first.master(), second.master());
    }
}
