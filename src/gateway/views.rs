//! Server-rendered pages.

use super::session::Flash;
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub flashes: Vec<Flash>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub user_email: String,
    pub flashes: Vec<Flash>,
}

/// Render a template into an HTML response.
pub fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!("Failed to render template: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::session::FlashLevel;

    #[test]
    fn login_page_lists_flashes() {
        let page = LoginPage {
            flashes: vec![Flash {
                level: FlashLevel::Error,
                message: "Incorrect email or password".to_string(),
            }],
        };
        let html = page.render().unwrap();
        assert!(html.contains("Incorrect email or password"));
        assert!(html.contains("flash-error"));
        assert!(html.contains(r#"action="/login""#));
        assert!(html.contains(r#"name="email""#));
        assert!(html.contains(r#"name="password""#));
    }

    #[test]
    fn dashboard_escapes_email() {
        let page = DashboardPage {
            user_email: "<script>@example.com".to_string(),
            flashes: Vec::new(),
        };
        let html = page.render().unwrap();
        assert!(!html.contains("<script>@"));
        assert!(html.contains("&lt;script&gt;@example.com"));
        assert!(html.contains(r#"href="/logout""#));
    }
}
