use crate::error::{Result, SavedQueryError};
use apigw_catalog::CatalogError;
use apigw_catalog::migrate::run_dbmate_up;
use sqlx::PgPool;

const SAVED_QUERIES_MIGRATION: &str =
    include_str!("../migrations/20240101000100_saved_queries.sql");

/// Create the `saved_queries` table and its indexes if they do not exist yet.
///
/// # Errors
///
/// Returns an error if the schema cannot be applied.
pub async fn apply_migrations(pool: &PgPool) -> Result<()> {
    run_dbmate_up(pool, "saved_queries", SAVED_QUERIES_MIGRATION)
        .await
        .map_err(|e| match e {
            CatalogError::StorageUnavailable(e) => SavedQueryError::StorageUnavailable(e),
            other => SavedQueryError::Migration(other.to_string()),
        })
}
