//! Map validated CLI arguments to an action.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{identity, logging, session, ARG_HOST, ARG_PORT};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let host = matches
        .get_one::<String>(ARG_HOST)
        .cloned()
        .unwrap_or_else(|| crate::gateway::config::DEFAULT_HOST.to_string());
    let port = matches
        .get_one::<u16>(ARG_PORT)
        .copied()
        .unwrap_or(crate::gateway::config::DEFAULT_PORT);

    let identity_opts = identity::Options::parse(matches)?;
    let session_opts = session::Options::parse(matches)?;

    Ok(Action::Server(Args {
        host,
        port,
        user_pool_id: identity_opts.user_pool_id,
        client_id: identity_opts.client_id,
        client_secret: identity_opts.client_secret,
        region: identity_opts.region,
        identity_endpoint: identity_opts.endpoint,
        session_secret: session_opts.secret,
        session_ttl_seconds: session_opts.ttl_seconds,
        cookie_secure: session_opts.cookie_secure,
        debug: matches.get_flag(logging::ARG_DEBUG),
    }))
}
