use super::{found, DASHBOARD_PATH, LOGIN_PATH};
use crate::gateway::session::Session;
use axum::response::Response;
use axum_extra::extract::cookie::SignedCookieJar;

// axum handler for /
pub async fn root(jar: SignedCookieJar) -> Response {
    if Session::load(&jar).is_authenticated() {
        found(DASHBOARD_PATH)
    } else {
        found(LOGIN_PATH)
    }
}
