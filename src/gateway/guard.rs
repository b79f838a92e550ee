//! Route guard for pages that need an authenticated session.

use super::{handlers::found, handlers::LOGIN_PATH, session::Session};
use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::debug;

/// Redirect to the login page unless the session carries an access token.
/// On success the loaded [`Session`] is handed to the handler as an extension.
pub async fn require_session(jar: SignedCookieJar, mut request: Request, next: Next) -> Response {
    let session = Session::load(&jar);

    if !session.is_authenticated() {
        debug!("No session for {}, redirecting to login", request.uri().path());
        return found(LOGIN_PATH);
    }

    request.extensions_mut().insert(session);
    next.run(request).await
}
