mod config;
mod output;

use anyhow::Context as _;
use apigw_catalog::{CatalogStore, Resolver, SearchEngine};
use apigw_saved_queries::SavedQueryStore;
use clap::{Parser, Subcommand, ValueEnum};
use config::{CatalogDbArgs, PoolArgs, SavedDbArgs};
use output::Printer;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "apigw", version, about = "Resolve, search and memoize calls against an imported API catalog")]
struct Cli {
    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[arg(long, value_enum, env = "APIGW_LOG_FORMAT", default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(flatten)]
    catalog_db: CatalogDbArgs,

    #[command(flatten)]
    saved_db: SavedDbArgs,

    #[command(flatten)]
    pool: PoolArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Map a concrete request path onto its documented catalog entry.
    Resolve {
        path: String,
        #[arg(short = 'X', long, default_value = "get")]
        method: String,
    },
    /// General search, at most 50 results.
    Search { query: String },
    /// Natural-language search ("show me open service tickets").
    NlSearch {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Ranked search with optional highlighted snippets.
    AdvancedSearch {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: i64,
        #[arg(long)]
        highlights: bool,
    },
    /// List catalog categories.
    Categories,
    /// List the endpoints of one category.
    Category { name: String },
    /// Create missing tables and indexes in both databases.
    Migrate,
    /// Inspect and manage saved queries.
    Saved {
        #[command(subcommand)]
        command: SavedCommand,
    },
}

#[derive(Debug, Subcommand)]
enum SavedCommand {
    /// List saved queries, most used first.
    List {
        /// Only entries whose description or path contains this text.
        #[arg(long)]
        search: Option<String>,
    },
    /// Show the saved query for (path, method).
    Show {
        path: String,
        #[arg(short = 'X', long, default_value = "get")]
        method: String,
    },
    /// Record a successful call.
    Save {
        path: String,
        #[arg(short = 'X', long, default_value = "get")]
        method: String,
        #[arg(short, long)]
        description: String,
        /// Query parameters as a JSON document.
        #[arg(long)]
        params: Option<String>,
        /// Request body as a JSON document.
        #[arg(long)]
        data: Option<String>,
    },
    /// Count one more use of a saved query.
    Touch { id: i32 },
    /// Delete one saved query.
    Delete { id: i32 },
    /// Delete every saved query.
    Clear {
        /// Required; guards against accidental wipes.
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn parse_json_arg(name: &str, raw: Option<&str>) -> anyhow::Result<Option<serde_json::Value>> {
    raw.map(|s| serde_json::from_str(s).with_context(|| format!("--{name} is not valid JSON")))
        .transpose()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    let out = Printer::new(cli.json);
    tracing::debug!(command = ?cli.command, "running");

    match cli.command {
        Command::Resolve { path, method } => {
            let resolver = Resolver::new(catalog_store(&cli.catalog_db, &cli.pool).await?);
            match resolver
                .resolve(&path, &method)
                .await
                .context("resolve endpoint")?
            {
                Some(detail) => out.endpoint(&detail)?,
                None => out.not_found(&format!(
                    "No catalog entry matches {} {path}.",
                    method.to_uppercase()
                ))?,
            }
        }
        Command::Search { query } => {
            let hits = search_engine(&cli.catalog_db, &cli.pool)
                .await?
                .search(&query)
                .await
                .context("search catalog")?;
            out.hits(&hits)?;
        }
        Command::NlSearch { query, limit } => {
            let hits = search_engine(&cli.catalog_db, &cli.pool)
                .await?
                .natural_language_search(&query, limit)
                .await
                .context("search catalog")?;
            out.hits(&hits)?;
        }
        Command::AdvancedSearch {
            query,
            limit,
            highlights,
        } => {
            let hits = search_engine(&cli.catalog_db, &cli.pool)
                .await?
                .advanced_search(&query, limit, highlights)
                .await
                .context("search catalog")?;
            out.hits(&hits)?;
        }
        Command::Categories => {
            let categories = search_engine(&cli.catalog_db, &cli.pool)
                .await?
                .list_categories()
                .await
                .context("list categories")?;
            out.categories(&categories)?;
        }
        Command::Category { name } => {
            let hits = search_engine(&cli.catalog_db, &cli.pool)
                .await?
                .endpoints_by_category(&name)
                .await
                .context("list category endpoints")?;
            out.hits(&hits)?;
        }
        Command::Migrate => {
            let catalog = catalog_store(&cli.catalog_db, &cli.pool).await?;
            apigw_catalog::migrate::apply_migrations(catalog.pool())
                .await
                .context("migrate catalog database")?;

            let saved_cfg = config::saved_queries_config(&cli.saved_db, &cli.pool)?;
            saved_cfg
                .ensure_database()
                .await
                .context("create saved-query database")?;
            let saved = saved_cfg
                .connect()
                .await
                .context("connect to saved-query database")?;
            apigw_saved_queries::migrate::apply_migrations(&saved)
                .await
                .context("migrate saved-query database")?;
            out.message("Migrations applied.")?;
        }
        Command::Saved { command } => {
            let store = saved_store(&cli.saved_db, &cli.pool).await?;
            run_saved(&store, command, &out).await?;
        }
    }

    Ok(())
}

async fn catalog_store(db: &CatalogDbArgs, pool: &PoolArgs) -> anyhow::Result<CatalogStore> {
    let cfg = config::catalog_config(db, pool)?;
    let pg = cfg.connect().await.context("connect to catalog database")?;
    Ok(CatalogStore::new(pg))
}

async fn search_engine(db: &CatalogDbArgs, pool: &PoolArgs) -> anyhow::Result<SearchEngine> {
    Ok(SearchEngine::new(catalog_store(db, pool).await?))
}

async fn saved_store(db: &SavedDbArgs, pool: &PoolArgs) -> anyhow::Result<SavedQueryStore> {
    let cfg = config::saved_queries_config(db, pool)?;
    let pg = cfg.connect().await.context("connect to saved-query database")?;
    Ok(SavedQueryStore::new(pg))
}

async fn run_saved(store: &SavedQueryStore, command: SavedCommand, out: &Printer) -> anyhow::Result<()> {
    match command {
        SavedCommand::List { search } => {
            let rows = match search {
                Some(term) => store.search(&term).await,
                None => store.list().await,
            }
            .context("list saved queries")?;
            out.saved(&rows)?;
        }
        SavedCommand::Show { path, method } => {
            match store.find(&path, &method).await.context("find saved query")? {
                Some(row) => out.saved_one(&row)?,
                None => out.not_found(&format!(
                    "No saved query for {} {path}.",
                    method.to_uppercase()
                ))?,
            }
        }
        SavedCommand::Save {
            path,
            method,
            description,
            params,
            data,
        } => {
            let params = parse_json_arg("params", params.as_deref())?;
            let data = parse_json_arg("data", data.as_deref())?;
            let id = store
                .save(&description, &path, &method, params.as_ref(), data.as_ref())
                .await
                .context("save query")?;
            out.saved_id(id)?;
        }
        SavedCommand::Touch { id } => {
            store.increment_usage(id).await.context("increment usage")?;
            out.message(&format!("Touched saved query #{id}."))?;
        }
        SavedCommand::Delete { id } => {
            let deleted = store.delete(id).await.context("delete saved query")?;
            if deleted {
                out.message(&format!("Deleted saved query #{id}."))?;
            } else {
                out.not_found(&format!("No saved query with id {id}."))?;
            }
        }
        SavedCommand::Clear { yes } => {
            if !yes {
                anyhow::bail!("refusing to delete every saved query without --yes");
            }
            let removed = store.clear_all().await.context("clear saved queries")?;
            out.message(&format!("Removed {removed} saved queries."))?;
        }
    }
    Ok(())
}
