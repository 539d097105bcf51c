//! Signed, expiring tokens for account activation and password reset.
//!
//! Both servers mint these: the storefront when someone registers or asks
//! for a reset, the admin when staff create an account. A token commits to
//! a claim string (user id plus the account state the link depends on) and
//! an hour-resolution timestamp:
//!
//! ```text
//! {hours_since_epoch:x}-{base64url(hmac_sha256(secret, claim ":" hours))}
//! ```
//!
//! Because the claim embeds mutable state (the activation flag, or the
//! password hash and last login), using the link changes the claim and
//! every previously issued token stops verifying. Tokens also expire
//! after [`TOKEN_VALIDITY_HOURS`].

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::UserId;

type HmacSha256 = Hmac<Sha256>;

/// How long activation and reset links stay valid.
pub const TOKEN_VALIDITY_HOURS: u64 = 72;

/// Hours elapsed since the Unix epoch.
fn now_hours() -> u64 {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    secs / 3600
}

fn mac_for(secret: &SecretString, claim: &str, hours: u64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(claim.as_bytes());
    mac.update(b":");
    mac.update(hours.to_string().as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Generate a token for a claim, stamped with the current hour.
#[must_use]
pub fn generate(secret: &SecretString, claim: &str) -> String {
    let hours = now_hours();
    format!("{hours:x}-{}", mac_for(secret, claim, hours))
}

/// Verify a token against a claim at the current time.
#[must_use]
pub fn verify(secret: &SecretString, claim: &str, token: &str) -> bool {
    verify_at(secret, claim, token, now_hours())
}

fn verify_at(secret: &SecretString, claim: &str, token: &str, now_hours: u64) -> bool {
    let Some((hours_part, mac_part)) = token.split_once('-') else {
        return false;
    };
    let Ok(hours) = u64::from_str_radix(hours_part, 16) else {
        return false;
    };

    // Reject future stamps (beyond one hour of clock skew) and stale ones.
    if hours > now_hours + 1 || now_hours.saturating_sub(hours) > TOKEN_VALIDITY_HOURS {
        return false;
    }

    let Ok(expected) = URL_SAFE_NO_PAD.decode(mac_part) else {
        return false;
    };

    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(claim.as_bytes());
    mac.update(b":");
    mac.update(hours.to_string().as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// Claim string an activation token commits to.
///
/// Activating the account flips `is_active` and invalidates the link.
#[must_use]
pub fn activation_claim(user_id: UserId, is_active: bool) -> String {
    format!("activation:{user_id}:{is_active}")
}

/// Claim string a reset token commits to.
///
/// Binds the current hash and last login so both a completed reset and a
/// subsequent login invalidate older links.
#[must_use]
pub fn reset_claim(user_id: UserId, password_hash: &str, last_login_ts: Option<i64>) -> String {
    let last_login = last_login_ts.map_or_else(String::new, |t| t.to_string());
    format!("reset:{user_id}:{password_hash}:{last_login}")
}

/// Encode a user id for use in activation/reset URLs.
#[must_use]
pub fn encode_uid(user_id: UserId) -> String {
    URL_SAFE_NO_PAD.encode(user_id.as_i32().to_string())
}

/// Decode a user id from an activation/reset URL segment.
#[must_use]
pub fn decode_uid(encoded: &str) -> Option<UserId> {
    let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    text.parse::<i32>().ok().map(UserId::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("kJ8vN2pQ7wX4mR9sT6yU3bC5dF1gH0aZ")
    }

    #[test]
    fn token_roundtrip() {
        let claim = activation_claim(UserId::new(7), false);
        let token = generate(&secret(), &claim);
        assert!(verify(&secret(), &claim, &token));
    }

    #[test]
    fn token_fails_for_different_claim() {
        let token = generate(&secret(), &activation_claim(UserId::new(7), false));
        assert!(!verify(
            &secret(),
            &activation_claim(UserId::new(7), true),
            &token
        ));
        assert!(!verify(
            &secret(),
            &activation_claim(UserId::new(8), false),
            &token
        ));
    }

    #[test]
    fn token_fails_for_different_secret() {
        let claim = reset_claim(UserId::new(7), "hash", None);
        let token = generate(&secret(), &claim);
        let other = SecretString::from("qQ9rS2tU5vW8xY1zA4bC7dE0fG3hJ6kM");
        assert!(!verify(&other, &claim, &token));
    }

    #[test]
    fn tampered_token_fails() {
        let claim = activation_claim(UserId::new(7), false);
        let mut token = generate(&secret(), &claim);
        token.push('x');
        assert!(!verify(&secret(), &claim, &token));
        assert!(!verify(&secret(), &claim, "not-a-token"));
        assert!(!verify(&secret(), &claim, ""));
    }

    #[test]
    fn token_expires() {
        let claim = activation_claim(UserId::new(7), false);
        let token = generate(&secret(), &claim);
        let issued = now_hours();
        assert!(verify_at(
            &secret(),
            &claim,
            &token,
            issued + TOKEN_VALIDITY_HOURS
        ));
        assert!(!verify_at(
            &secret(),
            &claim,
            &token,
            issued + TOKEN_VALIDITY_HOURS + 1
        ));
    }

    #[test]
    fn future_token_is_rejected() {
        let claim = activation_claim(UserId::new(7), false);
        let issued = now_hours();
        let token = format!("{:x}-{}", issued + 5, mac_for(&secret(), &claim, issued + 5));
        assert!(!verify_at(&secret(), &claim, &token, issued));
    }

    #[test]
    fn reset_claim_changes_with_login() {
        let with = reset_claim(UserId::new(7), "hash", Some(1_700_000_000));
        let without = reset_claim(UserId::new(7), "hash", None);
        assert_ne!(with, without);
    }

    #[test]
    fn uid_roundtrip() {
        let uid = encode_uid(UserId::new(42));
        assert_eq!(decode_uid(&uid), Some(UserId::new(42)));
        assert_eq!(decode_uid("###"), None);
        assert_eq!(decode_uid(""), None);
    }
}
