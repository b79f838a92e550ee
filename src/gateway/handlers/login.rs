//! Login form and credential submission.

use super::{found, DASHBOARD_PATH};
use crate::{
    gateway::{
        config::CookieSettings,
        session::{FlashLevel, Session},
        views::{render, LoginPage},
        AppState,
    },
    identity::{CredentialRequest, ErrorCode, IdentityError},
};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::SignedCookieJar;
use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;
use tracing::{error, info, instrument, warn};

pub const MISSING_CREDENTIALS: &str = "Please provide both email and password";
pub const LOGIN_SUCCESSFUL: &str = "Login successful!";
pub const INCORRECT_CREDENTIALS: &str = "Incorrect email or password";
pub const USER_NOT_FOUND: &str = "User not found";
pub const USER_NOT_CONFIRMED: &str = "Please verify your email address";

#[derive(Deserialize, Default)]
pub struct LoginForm {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

impl LoginForm {
    /// Both fields present and non-empty, or nothing.
    fn into_credentials(self) -> Option<(String, SecretString)> {
        let email = self.email.filter(|email| !email.is_empty())?;
        let password = self.password.filter(|password| !password.is_empty())?;
        Some((email, SecretString::from(password)))
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// User-facing text for a failed verification.
#[must_use]
pub fn failure_message(err: &IdentityError) -> String {
    match err {
        IdentityError::Rejected { code, message } => match code {
            ErrorCode::NotAuthorized => INCORRECT_CREDENTIALS.to_string(),
            ErrorCode::UserNotFound => USER_NOT_FOUND.to_string(),
            ErrorCode::UserNotConfirmed => USER_NOT_CONFIRMED.to_string(),
            ErrorCode::Other(_) => format!("Authentication error: {message}"),
        },
        other => format!("An error occurred: {other}"),
    }
}

// axum handler for GET /login
pub async fn login_form(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    render_login(Session::load(&jar), jar, state.config().cookie_settings())
}

// axum handler for POST /login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    payload: Option<Form<LoginForm>>,
) -> Response {
    let settings = state.config().cookie_settings();
    let mut session = Session::load(&jar);

    let form = payload.map(|Form(form)| form).unwrap_or_default();
    let Some((email, password)) = form.into_credentials() else {
        session.flash(FlashLevel::Error, MISSING_CREDENTIALS);
        return render_login(session, jar, settings);
    };

    let request = CredentialRequest::password_auth(email.clone(), password)
        .with_secret_hash(state.config().secret_hash(&email));

    match state.identity().verify_credentials(&request).await {
        Ok(tokens) => {
            info!(user = %email, "Login succeeded");

            session.authenticate(email, tokens);
            session.flash(FlashLevel::Success, LOGIN_SUCCESSFUL);

            (session.save(jar, settings), found(DASHBOARD_PATH)).into_response()
        }
        Err(err) => {
            match &err {
                IdentityError::Rejected { code, .. } => {
                    warn!(user = %email, code = %code, "Login rejected");
                }
                other => error!("Login failed: {}", other),
            }

            session.flash(FlashLevel::Error, failure_message(&err));
            render_login(session, jar, settings)
        }
    }
}

/// Render the form, consuming any pending flashes.
fn render_login(mut session: Session, jar: SignedCookieJar, settings: CookieSettings) -> Response {
    let page = LoginPage {
        flashes: session.take_flashes(),
    };

    (session.save(jar, settings), render(&page)).into_response()
}
