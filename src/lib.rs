//! # authgate
//!
//! A small login gateway in front of a managed identity provider (Amazon
//! Cognito). It renders a login form, forwards credentials to the provider's
//! `InitiateAuth` API, keeps the returned tokens in signed cookies and gates a
//! dashboard page behind them.
//!
//! Password hashing, token issuance and revocation all happen at the
//! provider. This crate only shapes HTTP around it.

pub mod cli;
pub mod gateway;
pub mod identity;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
