//! Invite tokens: random secret handed to the invitee, SHA-256 digest stored.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

pub const TOKEN_BYTES: usize = 32;

/// base64url length of `TOKEN_BYTES` without padding
pub const TOKEN_LEN: usize = 43;

/// A freshly minted invite token. `token` leaves the server exactly once.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

pub fn issue_token(now: DateTime<Utc>, expiry_days: i64) -> IssuedToken {
    let token = generate_token();
    let token_hash = hash_token(&token);
    IssuedToken {
        token,
        token_hash,
        expires_at: expiry_from(now, expiry_days),
    }
}

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Lowercase hex SHA-256 of the token as stored in `invites.token_hash`
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

pub fn expiry_from(now: DateTime<Utc>, expiry_days: i64) -> DateTime<Utc> {
    now + Duration::days(expiry_days)
}

pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= expires_at
}

/// Cheap shape check before touching the database
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Trim, lowercase and sanity-check an email address.
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    let mut parts = email.split('@');
    let (local, domain) = (parts.next()?, parts.next()?);
    if parts.next().is_some() || local.is_empty() || domain.is_empty() {
        return None;
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return None;
    }
    if email.chars().any(char::is_whitespace) || email.len() > 254 {
        return None;
    }
    Some(email)
}
