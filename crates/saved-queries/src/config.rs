use crate::error::Result;
use serde::{Deserialize, Serialize};
use sqlx::migrate::MigrateDatabase as _;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use std::time::Duration;

/// Connection settings for the saved-query database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQueriesConfig {
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout: Duration,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: Duration,
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(300)
}

impl SavedQueriesConfig {
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: default_max_connections(),
            acquire_timeout: default_acquire_timeout(),
            idle_timeout: default_idle_timeout(),
        }
    }

    /// Create the configured database if the server does not have it yet.
    ///
    /// Returns `true` when the database was created by this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be reached or the database cannot be created.
    pub async fn ensure_database(&self) -> Result<bool> {
        if Postgres::database_exists(&self.database_url).await? {
            return Ok(false);
        }
        Postgres::create_database(&self.database_url).await?;
        tracing::info!("created saved-query database");
        Ok(true)
    }

    /// Open a connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached.
    pub async fn connect(&self) -> Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(Some(self.idle_timeout))
            .test_before_acquire(true)
            .connect(&self.database_url)
            .await?;
        tracing::info!(max_connections = self.max_connections, "connected to saved-query database");
        Ok(pool)
    }
}
