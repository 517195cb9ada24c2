//! Database helpers for users, roles, sessions, and devices.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::device::DeviceProfile;

pub const DEFAULT_ROLE: &str = "user";

/// User row as read back by the auth paths.
#[derive(Debug)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Outcome when inserting a new user.
#[derive(Debug)]
pub enum InsertUserOutcome {
    Created(UserRecord),
    /// The email is already taken (unique violation).
    Conflict,
}

/// Joined user + most recently seen device, for the identity endpoint.
#[derive(Debug)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub email: String,
    pub device_name: Option<String>,
    pub device_last_seen: Option<DateTime<Utc>>,
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
    let query = "SELECT id, email, password_hash, created_at FROM users WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by email")?;

    Ok(row.map(|row| UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }))
}

pub async fn find_user_by_provider(
    pool: &PgPool,
    provider: &str,
    subject_id: &str,
) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, email, password_hash, created_at
        FROM users
        WHERE oauth_provider = $1 AND oauth_provider_id = $2
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(provider)
        .bind(subject_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by provider identity")?;

    Ok(row.map(|row| UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }))
}

/// Insert a user with either a password hash or a federation identity.
///
/// A unique violation on the email maps to `Conflict` so registration can
/// answer 409 without a separate existence probe.
pub async fn insert_user(
    pool: &PgPool,
    email: &str,
    password_hash: Option<&str>,
    provider: Option<(&str, &str)>,
) -> Result<InsertUserOutcome> {
    let query = r"
        INSERT INTO users (email, password_hash, oauth_provider, oauth_provider_id, mfa_enabled)
        VALUES ($1, $2, $3, $4, FALSE)
        RETURNING id, email, password_hash, created_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(password_hash)
        .bind(provider.map(|(name, _)| name))
        .bind(provider.map(|(_, subject)| subject))
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertUserOutcome::Created(UserRecord {
            id: row.get("id"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            created_at: row.get("created_at"),
        })),
        Err(err) if is_unique_violation(&err) => Ok(InsertUserOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// Return the default role id, creating the role on first use.
///
/// A unique violation on the insert means a concurrent request created it
/// first; re-read and proceed.
pub async fn ensure_default_role(pool: &PgPool) -> Result<Uuid> {
    let query = "SELECT id FROM roles WHERE name = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    if let Some(row) = sqlx::query(query)
        .bind(DEFAULT_ROLE)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup default role")?
    {
        return Ok(row.get("id"));
    }

    let insert = "INSERT INTO roles (name, description) VALUES ($1, $2) RETURNING id";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = insert
    );
    match sqlx::query(insert)
        .bind(DEFAULT_ROLE)
        .bind("Default user role")
        .fetch_one(pool)
        .instrument(span)
        .await
    {
        Ok(row) => Ok(row.get("id")),
        Err(err) if is_unique_violation(&err) => {
            let row = sqlx::query(query)
                .bind(DEFAULT_ROLE)
                .fetch_one(pool)
                .await
                .context("failed to re-read default role")?;
            Ok(row.get("id"))
        }
        Err(err) => Err(err).context("failed to create default role"),
    }
}

pub async fn assign_role(pool: &PgPool, user_id: Uuid, role_id: Uuid) -> Result<()> {
    let query = "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(role_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to assign role")?;
    Ok(())
}

/// Record one session row per login event. Rows are never updated; external
/// cleanup removes expired ones.
pub async fn create_session(
    pool: &PgPool,
    user_id: Uuid,
    refresh_token: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    let query = "INSERT INTO sessions (user_id, refresh_token, expires_at) VALUES ($1, $2, $3)";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(refresh_token)
        .bind(expires_at)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to create session")?;
    Ok(())
}

/// Atomic device reconciliation keyed by (user, ip): first login from an
/// address inserts the derived profile, later logins only bump `last_seen`.
pub async fn upsert_device(
    pool: &PgPool,
    user_id: Uuid,
    profile: &DeviceProfile,
    ip_address: &str,
) -> Result<()> {
    let query = r"
        INSERT INTO devices (user_id, device_name, device_type, ip_address, last_seen)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (user_id, ip_address)
        DO UPDATE SET last_seen = NOW()
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(&profile.name)
        .bind(profile.class.as_str())
        .bind(ip_address)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to upsert device")?;
    Ok(())
}

pub async fn fetch_user_with_latest_device(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<ProfileRow>> {
    let query = r"
        SELECT users.id AS user_id, users.email,
               latest.device_name, latest.last_seen AS device_last_seen
        FROM users
        LEFT JOIN LATERAL (
            SELECT device_name, last_seen
            FROM devices
            WHERE devices.user_id = users.id
            ORDER BY last_seen DESC
            LIMIT 1
        ) AS latest ON TRUE
        WHERE users.id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch user with latest device")?;

    Ok(row.map(|row| ProfileRow {
        user_id: row.get("user_id"),
        email: row.get("email"),
        device_name: row.get("device_name"),
        device_last_seen: row.get("device_last_seen"),
    }))
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct FakeDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "fake database error")
        }
    }

    impl StdError for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &'static str {
            "fake database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(FakeDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(FakeDbError {
            code: Some("42601"),
        }));
        assert!(!is_unique_violation(&err));

        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn insert_outcome_debug_names() {
        assert_eq!(format!("{:?}", InsertUserOutcome::Conflict), "Conflict");
    }

    #[test]
    fn default_role_name() {
        assert_eq!(DEFAULT_ROLE, "user");
    }
}
