//! Database helpers for credential and reset-token state.
//!
//! The auth core only reads the identity row and updates the password/reset
//! fields; ownership of the row (creation, profile edits, enrollment
//! references) belongs to the rest of the portal.

use anyhow::{anyhow, Context, Result};
use sqlx::{PgPool, Row};
use std::str::FromStr;
use tracing::Instrument;
use uuid::Uuid;

use super::role::Role;

/// An identity row as the auth core sees it.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Null means "no password set yet" (provisioned before first login).
    pub password_hash: Option<String>,
}

/// Candidate row for the reset-token matching scan.
#[derive(Debug, Clone)]
pub(super) struct ResetCandidate {
    pub(super) user_id: Uuid,
    pub(super) token_hash: String,
}

fn role_from_row(row: &sqlx::postgres::PgRow) -> Result<Role> {
    let raw: String = row.get("role");
    Role::from_str(&raw).map_err(|()| anyhow!("invalid role in users table: {raw}"))
}

/// Look up an identity by email, case-sensitive as stored.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Identity>> {
    let query = "SELECT id, name, email, role, password_hash FROM users WHERE email = $1";
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
        .context("failed to look up identity by email")?;

    match row {
        Some(row) => {
            let role = role_from_row(&row)?;
            Ok(Some(Identity {
                id: row.get("id"),
                name: row.get("name"),
                email: row.get("email"),
                role,
                password_hash: row.get("password_hash"),
            }))
        }
        None => Ok(None),
    }
}

/// List identities without credential or reset fields.
pub async fn list_identities(pool: &PgPool) -> Result<Vec<Identity>> {
    let query = "SELECT id, name, email, role FROM users ORDER BY name";
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
        .context("failed to list identities")?;

    let mut identities = Vec::with_capacity(rows.len());
    for row in rows {
        let role = role_from_row(&row)?;
        identities.push(Identity {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            role,
            password_hash: None,
        });
    }
    Ok(identities)
}

/// Persist a freshly minted reset-token hash and its expiry, replacing any
/// prior pair. Last request wins; the single-row update is the serialization
/// point, so no lock is needed.
pub(super) async fn store_reset_token(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &str,
    ttl_seconds: i64,
) -> Result<()> {
    let query = r"
        UPDATE users
        SET reset_token_hash = $2,
            reset_token_expires_at = NOW() + ($3 * INTERVAL '1 second')
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
        .bind(token_hash)
        .bind(ttl_seconds)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store reset token")?;

    Ok(())
}

/// Fetch every identity with a live (non-null, unexpired) reset token.
///
/// Scan-and-compare is fine at institution scale; a high-volume deployment
/// would key the lookup by a deterministic token identifier instead.
pub(super) async fn live_reset_candidates(pool: &PgPool) -> Result<Vec<ResetCandidate>> {
    let query = r"
        SELECT id, reset_token_hash
        FROM users
        WHERE reset_token_hash IS NOT NULL
          AND reset_token_expires_at > NOW()
    ";
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
        .context("failed to fetch reset candidates")?;

    Ok(rows
        .into_iter()
        .map(|row| ResetCandidate {
            user_id: row.get("id"),
            token_hash: row.get("reset_token_hash"),
        })
        .collect())
}

/// Write the new password hash and clear the reset-token pair in one update.
///
/// Both fields change in a single write so a token can never stay valid
/// after the password it unlocked has been replaced.
pub(super) async fn complete_reset(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<()> {
    let query = r"
        UPDATE users
        SET password_hash = $2,
            reset_token_hash = NULL,
            reset_token_expires_at = NULL
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
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to complete password reset")?;

    Ok(())
}
