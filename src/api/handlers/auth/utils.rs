//! Small helpers for auth validation, OTP codes, and token handling.

use anyhow::{Context, Result, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, RngCore, rngs::OsRng};
use regex::Regex;

/// Number of digits in a one-time code.
pub(super) const OTP_CODE_LENGTH: u32 = 6;

/// Normalize an email for lookup/uniqueness checks.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Generate a one-time code, uniformly random with leading zeros preserved.
pub(super) fn generate_otp_code() -> String {
    let max = 10u32.pow(OTP_CODE_LENGTH);
    let code = rand::thread_rng().gen_range(0..max);
    format!("{code:0width$}", width = OTP_CODE_LENGTH as usize)
}

/// Create a new opaque bearer token.
/// The raw value is both stored and returned; get-or-create semantics require
/// handing the persisted token back verbatim on later logins.
pub(super) fn generate_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate bearer token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a password into a PHC string for storage.
pub(super) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand_core::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Compare a candidate password against a stored PHC hash.
/// Malformed stored hashes count as a mismatch.
pub(super) fn verify_password(stored_hash: &str, password: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// A code is unusable once its creation time falls outside the TTL window.
pub(super) fn otp_expired(created_at: DateTime<Utc>, ttl_seconds: i64) -> bool {
    Utc::now() > created_at + Duration::seconds(ttl_seconds)
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
