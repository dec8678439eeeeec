//! Database access for the samples table.
//!
//! Every statement composes its predicate through the soft-delete filter, so
//! logically removed rows are never observed or mutated. Update and delete
//! carry their liveness check and mutation in one conditional statement; the
//! loser of a concurrent conflict sees zero returned rows.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::Sample;
use crate::api::soft_delete::where_live;

// Timestamps are rendered in the database so every caller gets the same
// RFC3339-style UTC strings.
const SELECT_COLUMNS: &str = r#"id::text AS id,
    text,
    to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at"#;

fn row_to_sample(row: &sqlx::postgres::PgRow) -> Sample {
    Sample {
        id: row.get("id"),
        text: row.get("text"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// All live samples. UUIDv7 ids are time-sortable, so ordering by id yields a
/// stable insertion order.
pub(super) async fn list_samples(pool: &PgPool) -> Result<Vec<Sample>> {
    let query = format!(
        "SELECT {SELECT_COLUMNS} FROM samples WHERE {} ORDER BY id",
        where_live(&[])
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list samples")?;

    Ok(rows.iter().map(row_to_sample).collect())
}

/// The unique live sample with this id, if any.
pub(super) async fn get_sample(pool: &PgPool, id: Uuid) -> Result<Option<Sample>> {
    let query = format!(
        "SELECT {SELECT_COLUMNS} FROM samples WHERE {}",
        where_live(&["id = $1"])
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch sample")?;

    Ok(row.as_ref().map(row_to_sample))
}

/// Insert a new sample. Both timestamps default to now() in the same
/// statement, so created_at and updated_at are identical on the returned row.
pub(super) async fn insert_sample(pool: &PgPool, id: Uuid, text: &str) -> Result<Sample> {
    let query =
        format!("INSERT INTO samples (id, text) VALUES ($1, $2) RETURNING {SELECT_COLUMNS}");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(id)
        .bind(text)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert sample")?;

    Ok(row_to_sample(&row))
}

/// Atomic conditional update: matches only the live row and mutates it in the
/// same statement. `None` covers never-existed and soft-deleted alike.
pub(super) async fn update_sample(pool: &PgPool, id: Uuid, text: &str) -> Result<Option<Sample>> {
    let query = format!(
        "UPDATE samples SET text = $2, updated_at = now() WHERE {} RETURNING {SELECT_COLUMNS}",
        where_live(&["id = $1"])
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(id)
        .bind(text)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update sample")?;

    Ok(row.as_ref().map(row_to_sample))
}

/// Atomic conditional soft delete. Returns false when no live row matched,
/// which makes repeated deletes indistinguishable from deleting a row that
/// never existed.
pub(super) async fn soft_delete_sample(pool: &PgPool, id: Uuid) -> Result<bool> {
    let query = format!(
        "UPDATE samples SET deleted_at = now() WHERE {} RETURNING id",
        where_live(&["id = $1"])
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to soft delete sample")?;

    Ok(row.is_some())
}
