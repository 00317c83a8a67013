//! Error types for `apigw-catalog`.

use thiserror::Error;

/// Main error type for catalog lookups and searches.
///
/// "Not found" is never an error here: lookups return `Option`/empty `Vec` instead.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Connection or transaction failure. Terminal for the request that hit it.
    #[error("Catalog storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),

    /// Caller input rejected before touching storage.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
