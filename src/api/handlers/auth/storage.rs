//! Database helpers for accounts, the OTP ledger, and bearer tokens.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::OtpPurpose;
use super::utils::{generate_token, is_unique_violation};

/// Outcome when attempting to create a new account.
#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created(Uuid),
    DuplicateEmail,
}

/// Stored account row, password hash included; handlers project public
/// fields out of this and never return the hash.
#[derive(Debug, Clone)]
pub(crate) struct UserRecord {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) phone: Option<String>,
    pub(crate) society: Option<String>,
    pub(crate) flat: Option<String>,
    pub(crate) email_verified: bool,
}

/// One row in the OTP ledger.
#[derive(Debug)]
pub(super) struct OtpRecord {
    pub(super) id: Uuid,
    pub(super) created_at: DateTime<Utc>,
    pub(super) verified: bool,
}

/// Account data resolved from a presented bearer token.
pub(crate) struct SessionRecord {
    pub(crate) user_id: Uuid,
    pub(crate) email: String,
}

pub(super) struct NewUser<'a> {
    pub(super) username: &'a str,
    pub(super) email: &'a str,
    pub(super) password_hash: &'a str,
    pub(super) phone: Option<&'a str>,
    pub(super) society: Option<&'a str>,
    pub(super) flat: Option<&'a str>,
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, phone, society, flat, email_verified";

fn user_from_row(row: &sqlx::postgres::PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        phone: row.get("phone"),
        society: row.get("society"),
        flat: row.get("flat"),
        email_verified: row.get("email_verified"),
    }
}

/// Insert a new account; a duplicate email is reported as an outcome, not an
/// error, so the handler can map it to a validation failure.
pub(super) async fn insert_user(
    conn: &mut PgConnection,
    user: &NewUser<'_>,
) -> Result<SignupOutcome> {
    let query = r"
        INSERT INTO users
            (username, email, password_hash, phone, society, flat)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.phone)
        .bind(user.society)
        .bind(user.flat)
        .fetch_one(conn)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(SignupOutcome::Created(row.get("id"))),
        Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::DuplicateEmail),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

pub(super) async fn lookup_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by email")?;

    Ok(row.as_ref().map(user_from_row))
}

pub(super) async fn insert_otp(
    conn: &mut PgConnection,
    user_id: Uuid,
    code: &str,
    purpose: OtpPurpose,
) -> Result<()> {
    let query = r"
        INSERT INTO otp_codes (user_id, code, purpose)
        VALUES ($1, $2, $3)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(code)
        .bind(purpose.as_str())
        .execute(conn)
        .instrument(span)
        .await
        .context("failed to insert OTP record")?;
    Ok(())
}

/// Invalidate all live codes for this purpose before a resend, so at most
/// one code can verify afterwards.
pub(super) async fn delete_unverified_otps(
    pool: &PgPool,
    user_id: Uuid,
    purpose: OtpPurpose,
) -> Result<u64> {
    let query = r"
        DELETE FROM otp_codes
        WHERE user_id = $1
          AND purpose = $2
          AND verified = FALSE
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .bind(purpose.as_str())
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete unverified OTP records")?;
    Ok(result.rows_affected())
}

/// Find the newest ledger entry matching account+code+purpose.
///
/// Already-verified entries still match: re-submitting a valid code re-marks
/// it and must behave idempotently, not fail.
pub(super) async fn find_latest_otp(
    pool: &PgPool,
    user_id: Uuid,
    code: &str,
    purpose: OtpPurpose,
) -> Result<Option<OtpRecord>> {
    let query = r"
        SELECT id, created_at, verified
        FROM otp_codes
        WHERE user_id = $1
          AND code = $2
          AND purpose = $3
        ORDER BY created_at DESC
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(code)
        .bind(purpose.as_str())
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup OTP record")?;

    Ok(row.map(|row| OtpRecord {
        id: row.get("id"),
        created_at: row.get("created_at"),
        verified: row.get("verified"),
    }))
}

pub(super) async fn mark_otp_verified(pool: &PgPool, otp_id: Uuid) -> Result<()> {
    let query = "UPDATE otp_codes SET verified = TRUE WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(otp_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to mark OTP verified")?;
    Ok(())
}

pub(super) async fn mark_email_verified(pool: &PgPool, user_id: Uuid) -> Result<()> {
    let query = r"
        UPDATE users
        SET email_verified = TRUE,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to mark email verified")?;
    Ok(())
}

/// Get-or-create the account's bearer token.
///
/// The primary key on `user_id` serializes concurrent first logins: whichever
/// insert wins, every caller ends up reading the same persisted token.
pub(super) async fn get_or_create_token(pool: &PgPool, user_id: Uuid) -> Result<String> {
    let insert_query = r"
        INSERT INTO auth_tokens (user_id, token)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO NOTHING
        RETURNING token
    ";
    let select_query = "SELECT token FROM auth_tokens WHERE user_id = $1";

    for _ in 0..3 {
        let token = generate_token()?;
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = insert_query
        );
        let inserted = sqlx::query(insert_query)
            .bind(user_id)
            .bind(&token)
            .fetch_optional(pool)
            .instrument(span)
            .await;

        match inserted {
            Ok(Some(row)) => return Ok(row.get("token")),
            Ok(None) => {}
            // Token column collision; regenerate and retry.
            Err(err) if is_unique_violation(&err) => continue,
            Err(err) => return Err(err).context("failed to insert bearer token"),
        }

        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = select_query
        );
        let existing = sqlx::query(select_query)
            .bind(user_id)
            .fetch_optional(pool)
            .instrument(span)
            .await
            .context("failed to lookup bearer token")?;

        // A concurrent logout can delete the row between the two statements;
        // loop around and insert again.
        if let Some(row) = existing {
            return Ok(row.get("token"));
        }
    }

    Err(anyhow!("failed to issue bearer token"))
}

pub(super) async fn lookup_session(pool: &PgPool, token: &str) -> Result<Option<SessionRecord>> {
    let query = r"
        SELECT users.id, users.email
        FROM auth_tokens
        JOIN users ON users.id = auth_tokens.user_id
        WHERE auth_tokens.token = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    Ok(row.map(|row| SessionRecord {
        user_id: row.get("id"),
        email: row.get("email"),
    }))
}

pub(super) async fn delete_token(pool: &PgPool, user_id: Uuid) -> Result<bool> {
    let query = "DELETE FROM auth_tokens WHERE user_id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete bearer token")?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::{NewUser, OtpRecord, SignupOutcome, UserRecord};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn signup_outcome_debug_names() {
        let created = format!("{:?}", SignupOutcome::Created(Uuid::nil()));
        assert!(created.starts_with("Created"));
        assert_eq!(
            format!("{:?}", SignupOutcome::DuplicateEmail),
            "DuplicateEmail"
        );
    }

    #[test]
    fn user_record_holds_values() {
        let record = UserRecord {
            id: Uuid::nil(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            phone: Some("5551234".to_string()),
            society: None,
            flat: None,
            email_verified: false,
        };
        assert_eq!(record.username, "alice");
        assert!(!record.email_verified);
    }

    #[test]
    fn otp_record_holds_values() {
        let record = OtpRecord {
            id: Uuid::nil(),
            created_at: Utc::now(),
            verified: false,
        };
        assert!(!record.verified);
    }

    #[test]
    fn new_user_borrows_optional_fields() {
        let user = NewUser {
            username: "alice",
            email: "alice@example.com",
            password_hash: "$argon2id$stub",
            phone: None,
            society: Some("Greenwood"),
            flat: Some("B-204"),
        };
        assert_eq!(user.society, Some("Greenwood"));
        assert!(user.phone.is_none());
    }
}
