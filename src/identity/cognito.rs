//! Cognito `InitiateAuth` over the AWS JSON 1.1 protocol.
//!
//! `USER_PASSWORD_AUTH` is an unauthenticated API call, so no request
//! signing is involved: the client id, and the secret hash when the app
//! client has a secret, are what the pool checks.

use super::{CredentialRequest, ErrorCode, IdentityError, IdentityProvider, Tokens};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const AMZ_TARGET: &str = "X-Amz-Target";
const AMZN_ERROR_TYPE: &str = "x-amzn-ErrorType";
const INITIATE_AUTH_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    auth_flow: &'a str,
    client_id: &'a str,
    auth_parameters: AuthParameters<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct AuthParameters<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_hash: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
    challenge_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(rename = "__type")]
    kind: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CognitoClient {
    http: Client,
    endpoint: Url,
    client_id: Option<String>,
}

impl CognitoClient {
    /// Create a client for the given endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: Url, client_id: Option<String>) -> Result<Self, IdentityError> {
        let http = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            endpoint,
            client_id,
        })
    }

    /// Regional public endpoint, e.g. `https://cognito-idp.us-east-1.amazonaws.com/`.
    ///
    /// # Errors
    /// Returns an error if the region does not form a valid host name.
    pub fn regional_endpoint(region: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!("https://cognito-idp.{region}.amazonaws.com/"))
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl IdentityProvider for CognitoClient {
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn verify_credentials(
        &self,
        request: &CredentialRequest,
    ) -> Result<Tokens, IdentityError> {
        let Some(client_id) = self.client_id.as_deref().filter(|id| !id.is_empty()) else {
            return Err(IdentityError::Misconfigured("client id is not set"));
        };

        let body = InitiateAuthRequest {
            auth_flow: request.auth_flow.as_str(),
            client_id,
            auth_parameters: AuthParameters {
                username: &request.username,
                password: request.password.expose_secret(),
                secret_hash: request.secret_hash.as_deref(),
            },
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, AMZ_JSON)
            .header(AMZ_TARGET, INITIATE_AUTH_TARGET)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let error_type = response
            .headers()
            .get(AMZN_ERROR_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        debug!("InitiateAuth responded with {}", status);

        if status.is_success() {
            parse_success(&bytes)
        } else {
            Err(parse_failure(status, error_type.as_deref(), &bytes))
        }
    }
}

fn parse_success(bytes: &[u8]) -> Result<Tokens, IdentityError> {
    let response: InitiateAuthResponse = serde_json::from_slice(bytes)
        .map_err(|err| IdentityError::MalformedResponse(err.to_string()))?;

    match (response.authentication_result, response.challenge_name) {
        (Some(result), _) => {
            let missing = |field: &str| IdentityError::MalformedResponse(format!("missing {field}"));
            Ok(Tokens {
                access_token: result.access_token.ok_or_else(|| missing("AccessToken"))?,
                id_token: result.id_token.ok_or_else(|| missing("IdToken"))?,
                refresh_token: result.refresh_token.ok_or_else(|| missing("RefreshToken"))?,
            })
        }
        (None, Some(challenge)) => Err(IdentityError::ChallengeRequired(challenge)),
        (None, None) => Err(IdentityError::MalformedResponse(
            "missing AuthenticationResult".to_string(),
        )),
    }
}

fn parse_failure(
    status: reqwest::StatusCode,
    error_type: Option<&str>,
    bytes: &[u8],
) -> IdentityError {
    let body: ErrorBody = serde_json::from_slice(bytes).unwrap_or_default();

    match body.kind.as_deref().or(error_type) {
        Some(kind) => IdentityError::Rejected {
            code: ErrorCode::parse(kind),
            message: body.message.unwrap_or_default(),
        },
        None => IdentityError::MalformedResponse(format!("unexpected status {status}")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use secrecy::SecretString;
    use serde_json::json;

    fn client(server: &mockito::ServerGuard) -> CognitoClient {
        let endpoint = Url::parse(&server.url()).unwrap();
        CognitoClient::new(endpoint, Some("client-id".to_string())).unwrap()
    }

    fn request() -> CredentialRequest {
        CredentialRequest::password_auth(
            "alice@example.com".to_string(),
            SecretString::from("hunter2".to_string()),
        )
    }

    #[test]
    fn regional_endpoint_uses_region() {
        let url = CognitoClient::regional_endpoint("eu-west-1").unwrap();
        assert_eq!(url.as_str(), "https://cognito-idp.eu-west-1.amazonaws.com/");
    }

    #[tokio::test]
    async fn sends_initiate_auth_and_returns_tokens() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-amz-target", INITIATE_AUTH_TARGET)
            .match_header("content-type", AMZ_JSON)
            .match_body(Matcher::Json(json!({
                "AuthFlow": "USER_PASSWORD_AUTH",
                "ClientId": "client-id",
                "AuthParameters": {
                    "USERNAME": "alice@example.com",
                    "PASSWORD": "hunter2",
                    "SECRET_HASH": "tag"
                }
            })))
            .with_status(200)
            .with_header("content-type", AMZ_JSON)
            .with_body(
                json!({
                    "AuthenticationResult": {
                        "AccessToken": "A",
                        "IdToken": "I",
                        "RefreshToken": "R",
                        "ExpiresIn": 3600,
                        "TokenType": "Bearer"
                    },
                    "ChallengeParameters": {}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let tokens = client(&server)
            .verify_credentials(&request().with_secret_hash(Some("tag".to_string())))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(tokens.access_token, "A");
        assert_eq!(tokens.id_token, "I");
        assert_eq!(tokens.refresh_token, "R");
    }

    #[tokio::test]
    async fn omits_secret_hash_when_absent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::Json(json!({
                "AuthFlow": "USER_PASSWORD_AUTH",
                "ClientId": "client-id",
                "AuthParameters": {
                    "USERNAME": "alice@example.com",
                    "PASSWORD": "hunter2"
                }
            })))
            .with_status(200)
            .with_body(
                json!({
                    "AuthenticationResult": {
                        "AccessToken": "A",
                        "IdToken": "I",
                        "RefreshToken": "R"
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = client(&server).verify_credentials(&request()).await;

        mock.assert_async().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn maps_rejection_from_type_field() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(400)
            .with_body(
                json!({
                    "__type": "NotAuthorizedException",
                    "message": "Incorrect username or password."
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = client(&server)
            .verify_credentials(&request())
            .await
            .unwrap_err();

        match err {
            IdentityError::Rejected { code, message } => {
                assert_eq!(code, ErrorCode::NotAuthorized);
                assert_eq!(message, "Incorrect username or password.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn maps_rejection_from_error_type_header() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(400)
            .with_header(AMZN_ERROR_TYPE, "UserNotConfirmedException:")
            .with_body(r#"{"Message":"User is not confirmed."}"#)
            .create_async()
            .await;

        let err = client(&server)
            .verify_credentials(&request())
            .await
            .unwrap_err();

        match err {
            IdentityError::Rejected { code, message } => {
                assert_eq!(code, ErrorCode::UserNotConfirmed);
                assert_eq!(message, "User is not confirmed.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn challenge_without_result_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(
                json!({
                    "ChallengeName": "NEW_PASSWORD_REQUIRED",
                    "Session": "opaque",
                    "ChallengeParameters": {}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = client(&server)
            .verify_credentials(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, IdentityError::ChallengeRequired(name) if name == "NEW_PASSWORD_REQUIRED"));
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(502)
            .with_body("<html>bad gateway</html>")
            .create_async()
            .await;

        let err = client(&server)
            .verify_credentials(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, IdentityError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn missing_client_id_skips_network() {
        let endpoint = Url::parse("http://127.0.0.1:9/").unwrap();
        let client = CognitoClient::new(endpoint, None).unwrap();

        let err = client.verify_credentials(&request()).await.unwrap_err();

        assert!(matches!(err, IdentityError::Misconfigured(_)));
    }
}
