use anyhow::Context as _;
use std::time::{Duration, Instant};
use testcontainers::core::IntoContainerPort;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

const PG_USER: &str = "postgres";
const PG_PASSWORD: &str = "postgres";

/// A throwaway Postgres server. The container is removed when this is dropped.
pub struct PgServer {
    _container: ContainerAsync<GenericImage>,
    pub host: String,
    pub port: u16,
}

impl PgServer {
    /// Connection URL for database `name` on this server.
    #[must_use]
    pub fn url(&self, name: &str) -> String {
        format!(
            "postgres://{PG_USER}:{PG_PASSWORD}@{}:{}/{name}",
            self.host, self.port
        )
    }

    /// URL of the default `postgres` database.
    #[must_use]
    pub fn admin_url(&self) -> String {
        self.url("postgres")
    }

    /// Create an empty database and return its URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be reached or the database already exists.
    pub async fn create_database(&self, name: &str) -> anyhow::Result<String> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(&self.admin_url())
            .await
            .context("connect to Postgres admin database")?;
        sqlx::query(&format!("create database \"{name}\""))
            .execute(&pool)
            .await
            .with_context(|| format!("create database {name}"))?;
        pool.close().await;
        Ok(self.url(name))
    }
}

/// Start a Postgres container and wait until it accepts connections.
///
/// # Errors
///
/// Returns an error if Docker is unavailable or Postgres does not come up in time.
pub async fn start_postgres() -> anyhow::Result<PgServer> {
    let container = GenericImage::new("postgres", "16-alpine")
        .with_exposed_port(5432.tcp())
        .with_env_var("POSTGRES_USER", PG_USER)
        .with_env_var("POSTGRES_PASSWORD", PG_PASSWORD)
        .start()
        .await
        .context("start postgres container")?;

    let host = container.get_host().await?.to_string();
    let port = container.get_host_port_ipv4(5432).await?;
    let server = PgServer {
        _container: container,
        host,
        port,
    };
    wait_pg_ready(&server.admin_url(), Duration::from_secs(30)).await?;
    Ok(server)
}

/// Poll until a connection to `database_url` succeeds.
///
/// # Errors
///
/// Returns an error if the timeout elapses first.
pub async fn wait_pg_ready(database_url: &str, timeout: Duration) -> anyhow::Result<()> {
    let start = Instant::now();
    loop {
        if start.elapsed() > timeout {
            anyhow::bail!("timed out waiting for Postgres");
        }

        if let Ok(pool) = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
        {
            pool.close().await;
            return Ok(());
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}
