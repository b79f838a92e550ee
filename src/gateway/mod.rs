//! # Auth Gateway
//!
//! Login, logout and a single protected page in front of a managed identity
//! provider. Credentials go straight to the provider; what comes back is
//! kept in signed cookies and nowhere else.
//!
//! A request is authenticated if and only if its session carries a
//! non-empty access token. Token validity is never checked locally.
//!
//! | route | method | |
//! |---|---|---|
//! | `/` | GET | redirect to `/dashboard` or `/login` |
//! | `/login` | GET, POST | form, credential submission |
//! | `/dashboard` | GET | guarded by [`guard::require_session`] |
//! | `/logout` | GET | clear session |
//! | `/health` | GET | liveness |

pub mod config;
pub mod guard;
pub mod handlers;
pub mod session;
pub mod views;

pub use config::GatewayConfig;

use crate::identity::{CognitoClient, IdentityProvider};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{FromRef, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, info_span, warn, Span};
use ulid::Ulid;

/// Shared, read-only request state.
#[derive(Clone)]
pub struct AppState {
    config: Arc<GatewayConfig>,
    identity: Arc<dyn IdentityProvider>,
    key: Key,
}

impl AppState {
    #[must_use]
    pub fn new(config: GatewayConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        let key = config.cookie_key();
        Self {
            config: Arc::new(config),
            identity,
            key,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(handlers::DASHBOARD_PATH, get(handlers::dashboard))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_session,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route(
            handlers::LOGIN_PATH,
            get(handlers::login_form).post(handlers::login),
        )
        .route("/logout", get(handlers::logout))
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span)),
        )
        .with_state(state)
}

/// Start the server
/// # Errors
/// Return error if the identity client cannot be built or the listener fails
pub async fn new(config: GatewayConfig) -> Result<()> {
    for warning in config.warnings() {
        warn!("{}", warning);
    }

    let endpoint = config.identity_endpoint()?;
    info!("Identity service endpoint: {}", endpoint);

    let identity = CognitoClient::new(endpoint, config.client_id().map(str::to_string))
        .context("Failed to build identity service client")?;

    let address = config.bind_address();
    let app = router(AppState::new(config, Arc::new(identity)));

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!("Listening on {}", address);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}
