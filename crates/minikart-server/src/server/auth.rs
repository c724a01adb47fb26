//! Password digests and bearer-token signing.
//!
//! Passwords are stored as `hex(salt)$hex(sha256(salt || password))` with a
//! fresh random salt per account. Session tokens are
//! `base64url(payload).base64url(digest)` where the payload is
//! `"{account_key}.{expires_at_millis}"` and the digest is a SHA-256 over
//! the server secret and the payload.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

/// Hashes a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    let digest = password_digest(&salt, password);
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Verifies a password against a stored `salt$digest` string.
pub fn verify_password(stored: &str, password: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(digest)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        return false;
    };
    constant_time_eq(&password_digest(&salt, password), &digest)
}

fn password_digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    pub account: u64,
    pub expires_at: u64,
}

/// Mints a signed bearer token for an account key.
pub fn mint_token(secret: &str, account: u64, expires_at: u64) -> String {
    let payload = format!("{account}.{expires_at}");
    let digest = token_digest(secret, &payload);
    format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(payload.as_bytes()),
        URL_SAFE_NO_PAD.encode(digest)
    )
}

/// Verifies a token's signature and expiry, returning its claims.
pub fn verify_token(secret: &str, token: &str, now_millis: u64) -> Option<TokenClaims> {
    let (payload_b64, digest_b64) = token.rsplit_once('.')?;
    let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
    let digest = URL_SAFE_NO_PAD.decode(digest_b64).ok()?;
    let payload = core::str::from_utf8(&payload).ok()?;

    if !constant_time_eq(&token_digest(secret, payload), &digest) {
        return None;
    }

    let (account, expires_at) = payload.split_once('.')?;
    let claims = TokenClaims {
        account: account.parse().ok()?,
        expires_at: expires_at.parse().ok()?,
    };
    (claims.expires_at > now_millis).then_some(claims)
}

fn token_digest(secret: &str, payload: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b".");
    hasher.update(payload.as_bytes());
    hasher.finalize().into()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
