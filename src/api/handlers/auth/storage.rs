//! Database helpers for users, verification codes, and the token blocklist.

use anyhow::{Context, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

/// Identity record backing every authenticated request.
#[derive(Clone, Debug)]
pub(crate) struct User {
    pub(crate) id: Uuid,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) role: String,
    pub(crate) notify: bool,
}

/// Outcome when inserting a user that may already exist.
#[derive(Debug)]
pub(crate) enum CreateUserOutcome {
    Created(User),
    Conflict,
}

/// Outcome when confirming a registration code.
#[derive(Debug)]
pub(crate) enum ConfirmOutcome {
    Created(User),
    Conflict,
    InvalidCode,
    ExpiredCode,
}

/// Postgres unique violation (SQLSTATE 23505), used to map duplicate emails
/// to a conflict instead of an internal error.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().as_deref() == Some("23505");
    }

    false
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: row.get("role"),
        notify: row.get("notify"),
    }
}

pub(crate) async fn user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let query = "SELECT id, email, password_hash, role, notify FROM users WHERE email = $1";
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
        .context("failed to lookup user")?;

    Ok(row.map(|row| user_from_row(&row)))
}

pub(crate) async fn list_users(pool: &PgPool) -> Result<Vec<User>> {
    let query = "SELECT id, email, password_hash, role, notify FROM users ORDER BY created_at";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list users")?;

    Ok(rows.iter().map(user_from_row).collect())
}

pub(crate) async fn insert_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    role: &str,
    notify: bool,
) -> Result<CreateUserOutcome> {
    let query = r"
        INSERT INTO users
            (email, password_hash, role, notify)
        VALUES ($1, $2, $3, $4)
        RETURNING id, email, password_hash, role, notify
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
        .bind(role)
        .bind(notify)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(CreateUserOutcome::Created(user_from_row(&row))),
        Err(err) => {
            if is_unique_violation(&err) {
                return Ok(CreateUserOutcome::Conflict);
            }

            Err(err).context("failed to insert user")
        }
    }
}

pub(crate) async fn update_password(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<()> {
    let query = "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update password")?;

    Ok(())
}

/// Store a verification code expiring `ttl_minutes` from now. Outstanding
/// codes for the same email are left alone; each stays valid until expiry.
pub(crate) async fn insert_verification(
    pool: &PgPool,
    email: &str,
    code: &str,
    ttl_minutes: i64,
) -> Result<()> {
    let query = r"
        INSERT INTO email_verifications
            (email, code, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 minute'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .bind(code)
        .bind(ttl_minutes)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to insert verification code")?;

    Ok(())
}

/// Redeem a verification code and create the user in one transaction.
///
/// The code is matched on (email, code) preferring the newest expiry, checked
/// against the database clock, and deleted in the same transaction that
/// inserts the user, so a code is consumed exactly once.
pub(crate) async fn confirm_registration(
    pool: &PgPool,
    email: &str,
    code: &str,
    password_hash: &str,
    role: &str,
) -> Result<ConfirmOutcome> {
    let mut tx = pool.begin().await.context("begin confirm transaction")?;

    let query = r"
        SELECT id, (expires_at > NOW()) AS valid
        FROM email_verifications
        WHERE email = $1 AND code = $2
        ORDER BY expires_at DESC
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(code)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to lookup verification code")?;

    let Some(row) = row else {
        let _ = tx.rollback().await;
        return Ok(ConfirmOutcome::InvalidCode);
    };

    let valid: bool = row.get("valid");
    if !valid {
        let _ = tx.rollback().await;
        return Ok(ConfirmOutcome::ExpiredCode);
    }

    let verification_id: Uuid = row.get("id");

    let query = r"
        INSERT INTO users
            (email, password_hash, role, notify)
        VALUES ($1, $2, $3, TRUE)
        RETURNING id, email, password_hash, role, notify
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
        .bind(role)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let user = match row {
        Ok(row) => user_from_row(&row),
        Err(err) => {
            if is_unique_violation(&err) {
                let _ = tx.rollback().await;
                return Ok(ConfirmOutcome::Conflict);
            }

            return Err(err).context("failed to insert user");
        }
    };

    let query = "DELETE FROM email_verifications WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(verification_id)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to delete verification code")?;

    tx.commit().await.context("commit confirm transaction")?;

    Ok(ConfirmOutcome::Created(user))
}

/// Add a token identifier to the blocklist. Revoking twice is not an error.
pub(crate) async fn revoke_token(pool: &PgPool, jti: &str) -> Result<()> {
    let query = "INSERT INTO token_blocklist (jti) VALUES ($1) ON CONFLICT (jti) DO NOTHING";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(jti)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to revoke token")?;

    Ok(())
}

pub(crate) async fn is_token_revoked(pool: &PgPool, jti: &str) -> Result<bool> {
    let query = "SELECT EXISTS (SELECT 1 FROM token_blocklist WHERE jti = $1) AS revoked";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(jti)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to check token blocklist")?;

    Ok(row.get("revoked"))
}

#[cfg(test)]
mod tests {
    use super::{ConfirmOutcome, CreateUserOutcome, User};
    use uuid::Uuid;

    #[test]
    fn test_outcome_debug_names() {
        let user = User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: "viewer".to_string(),
            notify: true,
        };

        assert!(format!("{:?}", CreateUserOutcome::Created(user)).contains("Created"));
        assert!(format!("{:?}", CreateUserOutcome::Conflict).contains("Conflict"));
        assert!(format!("{:?}", ConfirmOutcome::InvalidCode).contains("InvalidCode"));
        assert!(format!("{:?}", ConfirmOutcome::ExpiredCode).contains("ExpiredCode"));
    }
}
