use thiserror::Error;

#[derive(Error, Debug)]
pub enum SavedQueryError {
    /// Connection, statement or transaction failure. Writes never swallow this.
    #[error("Saved-query storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

pub type Result<T> = std::result::Result<T, SavedQueryError>;
