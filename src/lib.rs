//! # Klayons (Registration & Authentication Backend)
//!
//! `klayons` is the account backend for the Klayons platform. It handles
//! email/password signup, OTP-based email verification, OTP-gated login, and
//! opaque bearer-token issuance.
//!
//! ## Authentication flow
//!
//! Every flow is two-step. Registration creates the account and emails a
//! 6-digit code; the account stays unverified (and unable to log in) until the
//! code is submitted to `/api/auth/verify-otp/`. Login first checks the
//! password, then emails a fresh code that must be verified the same way.
//!
//! - **OTP codes** are bound to an account and a purpose (`registration` or
//!   `login`), expire after a configurable TTL (default 10 minutes), and are
//!   delivered synchronously over SMTP within the triggering request.
//! - **Resend** invalidates all earlier unverified codes for the same purpose
//!   before issuing a new one, so at most one live code remains afterwards.
//! - **Bearer tokens** are opaque, one per account, created on first
//!   successful verification and returned unchanged on every later login.
//!   Logout deletes the token; the next login cycle mints a fresh one.
//!
//! Unauthorized requests to authenticated endpoints return `401`; domain
//! failures are reported as `{"error": "..."}` JSON with explicit status
//! codes.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
