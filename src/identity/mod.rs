//! Identity Service seam.
//!
//! The gateway never validates credentials itself. It hands them to an
//! [`IdentityProvider`] and keeps whatever opaque tokens come back. The only
//! production implementation is [`CognitoClient`]; tests plug in their own.

mod cognito;
mod secret_hash;

pub use cognito::CognitoClient;
pub use secret_hash::secret_hash;

use async_trait::async_trait;
use secrecy::SecretString;
use std::fmt;

/// Authentication flows understood by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthFlow {
    UserPasswordAuth,
}

impl AuthFlow {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserPasswordAuth => "USER_PASSWORD_AUTH",
        }
    }
}

/// A single credential verification attempt. Never persisted.
#[derive(Debug)]
pub struct CredentialRequest {
    pub username: String,
    pub password: SecretString,
    pub auth_flow: AuthFlow,
    pub secret_hash: Option<String>,
}

impl CredentialRequest {
    #[must_use]
    pub fn password_auth(username: String, password: SecretString) -> Self {
        Self {
            username,
            password,
            auth_flow: AuthFlow::UserPasswordAuth,
            secret_hash: None,
        }
    }

    #[must_use]
    pub fn with_secret_hash(mut self, secret_hash: Option<String>) -> Self {
        self.secret_hash = secret_hash;
        self
    }
}

/// Opaque tokens issued on successful authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Tokens {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokens")
            .field("access_token", &"***")
            .field("id_token", &"***")
            .field("refresh_token", &"***")
            .finish()
    }
}

/// Provider-reported rejection categories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    NotAuthorized,
    UserNotFound,
    UserNotConfirmed,
    Other(String),
}

impl ErrorCode {
    /// Parse a provider error type such as `NotAuthorizedException` or
    /// `com.amazonaws.cognito#UserNotFoundException`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let name = raw.rsplit('#').next().unwrap_or(raw).trim();
        // x-amzn-ErrorType may carry a trailing ":uri" part
        let name = name.split(':').next().unwrap_or(name);
        match name {
            "NotAuthorizedException" => Self::NotAuthorized,
            "UserNotFoundException" => Self::UserNotFound,
            "UserNotConfirmedException" => Self::UserNotConfirmed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthorized => f.write_str("NotAuthorizedException"),
            Self::UserNotFound => f.write_str("UserNotFoundException"),
            Self::UserNotConfirmed => f.write_str("UserNotConfirmedException"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("{code}: {message}")]
    Rejected { code: ErrorCode, message: String },

    #[error("identity service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed identity service response: {0}")]
    MalformedResponse(String),

    #[error("authentication challenge {0} is not supported")]
    ChallengeRequired(String),

    #[error("identity service is not configured: {0}")]
    Misconfigured(&'static str),
}

/// Verifies credentials and issues session tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_credentials(&self, request: &CredentialRequest)
        -> Result<Tokens, IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_parses_known_types() {
        assert_eq!(
            ErrorCode::parse("NotAuthorizedException"),
            ErrorCode::NotAuthorized
        );
        assert_eq!(
            ErrorCode::parse("UserNotFoundException"),
            ErrorCode::UserNotFound
        );
        assert_eq!(
            ErrorCode::parse("UserNotConfirmedException"),
            ErrorCode::UserNotConfirmed
        );
    }

    #[test]
    fn error_code_strips_namespace_and_uri() {
        assert_eq!(
            ErrorCode::parse("com.amazonaws.cognito.identityprovider#NotAuthorizedException"),
            ErrorCode::NotAuthorized
        );
        assert_eq!(
            ErrorCode::parse("UserNotFoundException:http://internal.amazon.com/"),
            ErrorCode::UserNotFound
        );
    }

    #[test]
    fn error_code_keeps_unknown_names() {
        let code = ErrorCode::parse("TooManyRequestsException");
        assert_eq!(code, ErrorCode::Other("TooManyRequestsException".to_string()));
        assert_eq!(code.to_string(), "TooManyRequestsException");
    }

    #[test]
    fn tokens_debug_is_redacted() {
        let tokens = Tokens {
            access_token: "access".to_string(),
            id_token: "identity".to_string(),
            refresh_token: "refresh".to_string(),
        };
        let debug = format!("{tokens:?}");
        assert!(!debug.contains("access\""));
        assert!(!debug.contains("identity"));
        assert!(!debug.contains("refresh\""));
    }

    #[test]
    fn auth_flow_wire_value() {
        assert_eq!(AuthFlow::UserPasswordAuth.as_str(), "USER_PASSWORD_AUTH");
    }
}
