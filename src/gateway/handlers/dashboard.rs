use crate::gateway::{
    session::Session,
    views::{render, DashboardPage},
    AppState,
};
use axum::{
    extract::{Extension, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;

const FALLBACK_NAME: &str = "User";

/// Protected page. Only reachable through the session guard, which supplies
/// the already-loaded session.
pub async fn dashboard(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Extension(mut session): Extension<Session>,
) -> Response {
    let page = DashboardPage {
        user_email: session.user_email().unwrap_or(FALLBACK_NAME).to_string(),
        flashes: session.take_flashes(),
    };

    (
        session.save(jar, state.config().cookie_settings()),
        render(&page),
    )
        .into_response()
}
