//! Minimal runner for dbmate-style migration files.
//!
//! Migrations live next to each crate (`migrations/*.sql`) with `-- migrate:up` and
//! `-- migrate:down` sections so they can also be applied with dbmate directly. Every `up`
//! statement is written to be idempotent.

use crate::error::{CatalogError, Result};
use sqlx::PgPool;

const CATALOG_MIGRATION: &str = include_str!("../migrations/20240101000000_catalog.sql");

/// Extract the `up` section of a dbmate migration.
///
/// # Errors
///
/// Returns [`CatalogError::Migration`] if either marker is missing.
pub fn extract_dbmate_up(sql: &str) -> Result<&str> {
    let (_, rest) = sql
        .split_once("-- migrate:up")
        .ok_or_else(|| CatalogError::Migration("missing dbmate marker: -- migrate:up".into()))?;
    let (up, _) = rest
        .split_once("-- migrate:down")
        .ok_or_else(|| CatalogError::Migration("missing dbmate marker: -- migrate:down".into()))?;
    Ok(up.trim())
}

/// Execute the `up` section of `sql` statement by statement inside one transaction.
///
/// # Errors
///
/// Returns an error if the file is malformed or any statement fails; nothing is committed in
/// that case.
pub async fn run_dbmate_up(pool: &PgPool, name: &str, sql: &str) -> Result<()> {
    let up = extract_dbmate_up(sql)?;
    let mut tx = pool.begin().await?;
    for stmt in up.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(stmt)
            .execute(&mut *tx)
            .await
            .map_err(|e| CatalogError::Migration(format!("{name}: {e}")))?;
    }
    tx.commit().await?;
    tracing::debug!(migration = %name, "applied migration");
    Ok(())
}

/// Create the catalog tables and indexes if they do not exist yet.
///
/// # Errors
///
/// Returns an error if the schema cannot be applied.
pub async fn apply_migrations(pool: &PgPool) -> Result<()> {
    run_dbmate_up(pool, "catalog", CATALOG_MIGRATION).await
}
