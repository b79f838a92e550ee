//! Message authentication tag required by app clients that carry a secret.

use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute `base64(HMAC-SHA256(client_secret, username || client_id))`.
///
/// The byte layout must match the provider exactly: the UTF-8 username
/// immediately followed by the UTF-8 client id, no separator.
#[must_use]
pub fn secret_hash(username: &str, client_id: &str, client_secret: &str) -> String {
    // HMAC accepts keys of any length, so this never fails
    let Ok(mut mac) = HmacSha256::new_from_slice(client_secret.as_bytes()) else {
        return String::new();
    };
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    Base64::encode_string(&mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_vector() {
        assert_eq!(
            secret_hash("alice@example.com", "client-id", "client-secret"),
            "sdWYXbCR79nQTSGLjdIIScXPRoMoiaj0trWzF8kEGXg="
        );
    }

    #[test]
    fn hashes_utf8_usernames() {
        assert_eq!(
            secret_hash("josé@example.com", "abc123", "s3cr3t"),
            "F7sdi/NA+TNzGs0D5ccqkq/FjO/izpPGKSukc2kZnXs="
        );
    }

    #[test]
    fn depends_on_every_input() {
        let base = secret_hash("alice@example.com", "client-id", "client-secret");
        assert_ne!(base, secret_hash("bob@example.com", "client-id", "client-secret"));
        assert_ne!(base, secret_hash("alice@example.com", "other-id", "client-secret"));
        assert_ne!(base, secret_hash("alice@example.com", "client-id", "other-secret"));
    }
}
