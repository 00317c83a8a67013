use crate::error::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Connection settings for the read-mostly API catalog database.
///
/// Built once at startup and passed into [`CatalogConfig::connect`]; nothing in this crate reads
/// the process environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogConfig {
    /// Postgres connection URL.
    pub database_url: String,

    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a caller waits for a pooled connection before failing.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout: Duration,

    /// Idle connections are closed after this long.
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

impl CatalogConfig {
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: default_max_connections(),
            acquire_timeout: default_acquire_timeout(),
            idle_timeout: default_idle_timeout(),
        }
    }

    /// Open a connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CatalogError::StorageUnavailable`] if the database cannot be reached.
    pub async fn connect(&self) -> Result<PgPool> {
        let pool = self.pool_options().connect(&self.database_url).await?;
        tracing::info!(max_connections = self.max_connections, "connected to catalog database");
        Ok(pool)
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(Some(self.idle_timeout))
            .test_before_acquire(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied_when_deserializing() {
        let cfg: CatalogConfig =
            serde_json::from_str(r#"{"databaseUrl":"postgres://localhost/api"}"#)
                .expect("valid config");
        assert_eq!(cfg.database_url, "postgres://localhost/api");
        assert_eq!(cfg.max_connections, 10);
        assert_eq!(cfg.acquire_timeout, Duration::from_secs(5));
        assert_eq!(cfg.idle_timeout, Duration::from_secs(300));
    }
}
