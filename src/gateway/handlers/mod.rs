//! Request handlers for the gateway routes.

pub mod dashboard;
pub use self::dashboard::dashboard;

pub mod health;
pub use self::health::health;

pub mod login;
pub use self::login::{login, login_form};

pub mod logout;
pub use self::logout::logout;

pub mod root;
pub use self::root::root;

use axum::{
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
};

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// `302 Found` to `location`.
pub fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}
