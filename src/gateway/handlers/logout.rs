use super::{found, LOGIN_PATH};
use crate::gateway::{
    session::{FlashLevel, Session},
    AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::info;

pub const LOGGED_OUT: &str = "You have been logged out";

// axum handler for logout
pub async fn logout(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    let mut session = Session::load(&jar);

    if let Some(email) = session.user_email() {
        info!(user = email, "Logged out");
    }

    session.clear();
    session.flash(FlashLevel::Success, LOGGED_OUT);

    (
        session.save(jar, state.config().cookie_settings()),
        found(LOGIN_PATH),
    )
        .into_response()
}
