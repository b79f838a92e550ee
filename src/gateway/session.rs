//! Cookie-backed session.
//!
//! Nothing is kept server side. Every attribute lives in its own signed
//! cookie so the provider's tokens, which are large, each stay under the
//! per-cookie size limit. A cookie whose signature does not verify is
//! treated as absent.
//!
//! The email cookie also carries a digest of the three tokens, so cookies
//! signed for different logins cannot be mixed into one session. Identity
//! cookies that do not match that digest are all dropped.

use super::config::CookieSettings;
use crate::identity::Tokens;
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::debug;

pub const ACCESS_TOKEN_COOKIE: &str = "authgate_access_token";
pub const ID_TOKEN_COOKIE: &str = "authgate_id_token";
pub const REFRESH_TOKEN_COOKIE: &str = "authgate_refresh_token";
pub const USER_EMAIL_COOKIE: &str = "authgate_user_email";
pub const FLASH_COOKIE: &str = "authgate_flash";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

impl FlashLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// One-shot notification shown on the next rendered page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Payload of the email cookie.
#[derive(Serialize, Deserialize)]
struct IdentityBinding {
    email: String,
    tokens: String,
}

#[derive(Clone, Default)]
pub struct Session {
    access_token: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    user_email: Option<String>,
    flashes: Vec<Flash>,
    flash_cookie_present: bool,
    identity_changed: bool,
    flashes_changed: bool,
}

impl Session {
    /// Rebuild the session from the request cookies.
    #[must_use]
    pub fn load(jar: &SignedCookieJar) -> Self {
        let raw_flashes = read(jar, FLASH_COOKIE);
        let flash_cookie_present = raw_flashes.is_some();
        let flashes = raw_flashes
            .and_then(|raw| match serde_json::from_str::<Vec<Flash>>(&raw) {
                Ok(flashes) => Some(flashes),
                Err(err) => {
                    debug!("Discarding unreadable flash cookie: {}", err);
                    None
                }
            })
            .unwrap_or_default();

        let access_token = read(jar, ACCESS_TOKEN_COOKIE);
        let id_token = read(jar, ID_TOKEN_COOKIE);
        let refresh_token = read(jar, REFRESH_TOKEN_COOKIE);
        let binding = read(jar, USER_EMAIL_COOKIE)
            .and_then(|raw| serde_json::from_str::<IdentityBinding>(&raw).ok());
        let digest = tokens_digest(
            access_token.as_deref(),
            id_token.as_deref(),
            refresh_token.as_deref(),
        );

        let (access_token, id_token, refresh_token, user_email) = match binding {
            Some(binding) if binding.tokens == digest => {
                (access_token, id_token, refresh_token, Some(binding.email))
            }
            _ => {
                if access_token.is_some() || id_token.is_some() || refresh_token.is_some() {
                    debug!("Discarding identity cookies that do not belong to one login");
                }
                (None, None, None, None)
            }
        };

        Self {
            access_token,
            id_token,
            refresh_token,
            user_email,
            flashes,
            flash_cookie_present,
            identity_changed: false,
            flashes_changed: false,
        }
    }

    /// Authenticated means a non-empty access token, nothing more.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().is_some_and(|token| !token.is_empty())
    }

    pub fn authenticate(&mut self, user_email: String, tokens: Tokens) {
        self.access_token = Some(tokens.access_token);
        self.id_token = Some(tokens.id_token);
        self.refresh_token = Some(tokens.refresh_token);
        self.user_email = Some(user_email);
        self.identity_changed = true;
    }

    /// Drop every attribute, pending flashes included.
    pub fn clear(&mut self) {
        self.access_token = None;
        self.id_token = None;
        self.refresh_token = None;
        self.user_email = None;
        self.identity_changed = true;
        if !self.flashes.is_empty() {
            self.flashes.clear();
            self.flashes_changed = true;
        }
    }

    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flashes.push(Flash {
            level,
            message: message.into(),
        });
        self.flashes_changed = true;
    }

    /// Hand out pending flashes; they will not be shown again.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        if !self.flashes.is_empty() {
            self.flashes_changed = true;
        }
        std::mem::take(&mut self.flashes)
    }

    #[must_use]
    pub fn flashes(&self) -> &[Flash] {
        &self.flashes
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    #[must_use]
    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    #[must_use]
    pub fn user_email(&self) -> Option<&str> {
        self.user_email.as_deref()
    }

    /// Write changed attributes back to the jar. Unchanged cookies are left
    /// alone so reads do not produce `Set-Cookie` headers.
    #[must_use]
    pub fn save(&self, jar: SignedCookieJar, settings: CookieSettings) -> SignedCookieJar {
        let mut jar = jar;

        if self.identity_changed {
            jar = write(jar, ACCESS_TOKEN_COOKIE, self.access_token.as_deref(), settings);
            jar = write(jar, ID_TOKEN_COOKIE, self.id_token.as_deref(), settings);
            jar = write(jar, REFRESH_TOKEN_COOKIE, self.refresh_token.as_deref(), settings);
            let binding = self.user_email.as_ref().and_then(|email| {
                serde_json::to_string(&IdentityBinding {
                    email: email.clone(),
                    tokens: tokens_digest(
                        self.access_token.as_deref(),
                        self.id_token.as_deref(),
                        self.refresh_token.as_deref(),
                    ),
                })
                .ok()
            });
            jar = write(jar, USER_EMAIL_COOKIE, binding.as_deref(), settings);
        }

        // a flash raised and shown within one request never reaches the browser
        if self.flashes_changed && (self.flash_cookie_present || !self.flashes.is_empty()) {
            let encoded = if self.flashes.is_empty() {
                None
            } else {
                serde_json::to_string(&self.flashes).ok()
            };
            jar = write(jar, FLASH_COOKIE, encoded.as_deref(), settings);
        }

        jar
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "***");
        f.debug_struct("Session")
            .field("access_token", &redact(&self.access_token))
            .field("id_token", &redact(&self.id_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("user_email", &self.user_email)
            .field("flashes", &self.flashes)
            .finish_non_exhaustive()
    }
}

fn tokens_digest(access: Option<&str>, id: Option<&str>, refresh: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    for token in [access, id, refresh] {
        hasher.update(token.unwrap_or_default().as_bytes());
        hasher.update([0u8]);
    }
    Base64UrlUnpadded::encode_string(hasher.finalize().as_slice())
}

fn read(jar: &SignedCookieJar, name: &str) -> Option<String> {
    let cookie = jar.get(name)?;
    let bytes = Base64UrlUnpadded::decode_vec(cookie.value()).ok()?;
    String::from_utf8(bytes).ok()
}

fn write(
    jar: SignedCookieJar,
    name: &'static str,
    value: Option<&str>,
    settings: CookieSettings,
) -> SignedCookieJar {
    match value.filter(|value| !value.is_empty()) {
        Some(value) => jar.add(
            Cookie::build((name, Base64UrlUnpadded::encode_string(value.as_bytes())))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(settings.secure)
                .max_age(time::Duration::seconds(settings.max_age_seconds)),
        ),
        None => jar.remove(Cookie::build((name, "")).path("/")),
    }
}
