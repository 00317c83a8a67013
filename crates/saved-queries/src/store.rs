//! Memo of successful API calls.
//!
//! One row per canonical (path, method). Every write is a single statement, so concurrent
//! callers never lose a `usage_count` increment.

use crate::error::Result;
use apigw_catalog::paths;
use apigw_catalog::search::keywords::contains_pattern;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuery {
    pub id: i32,
    pub description: String,
    pub path: String,
    pub method: String,
    pub params: Option<Value>,
    pub data: Option<Value>,
    /// Unix seconds of the last save or use.
    pub timestamp: i64,
    pub usage_count: i32,
}

/// Canonical store key: normalized path, upper-case method.
#[must_use]
pub fn canonical_key(path: &str, method: &str) -> (String, String) {
    (paths::normalize(path), method.trim().to_ascii_uppercase())
}

const COLUMNS: &str = r#"id, description, path, method, params, data, "timestamp", usage_count"#;

#[derive(Debug, Clone)]
pub struct SavedQueryStore {
    pool: PgPool,
}

impl SavedQueryStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert or overwrite the entry for (path, method) and return its id.
    ///
    /// A repeat save replaces description, params and data, bumps `usage_count` and refreshes
    /// the timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn save(
        &self,
        description: &str,
        path: &str,
        method: &str,
        params: Option<&Value>,
        data: Option<&Value>,
    ) -> Result<i32> {
        let (path, method) = canonical_key(path, method);
        let (id, usage_count) = sqlx::query_as::<_, (i32, i32)>(
            r#"
insert into saved_queries (description, path, method, params, data, "timestamp", usage_count)
values ($1, $2, $3, $4, $5, extract(epoch from now())::bigint, 1)
on conflict (path, method) do update
set description = excluded.description,
    params = excluded.params,
    data = excluded.data,
    "timestamp" = excluded."timestamp",
    usage_count = saved_queries.usage_count + 1
returning id, usage_count
"#,
        )
        .bind(description)
        .bind(&path)
        .bind(&method)
        .bind(params)
        .bind(data)
        .fetch_one(&self.pool)
        .await?;

        if usage_count == 1 {
            tracing::info!(%path, %method, id, "saved new query");
        } else {
            tracing::info!(%path, %method, id, usage_count, "updated saved query");
        }
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find(&self, path: &str, method: &str) -> Result<Option<SavedQuery>> {
        let (path, method) = canonical_key(path, method);
        let row = sqlx::query_as::<_, SavedQuery>(&format!(
            "select {COLUMNS} from saved_queries where path = $1 and method = $2"
        ))
        .bind(&path)
        .bind(&method)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Bump `usage_count` and refresh the timestamp. A missing id is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn increment_usage(&self, id: i32) -> Result<()> {
        let affected = sqlx::query(
            r#"
update saved_queries
set usage_count = usage_count + 1,
    "timestamp" = extract(epoch from now())::bigint
where id = $1
"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if affected == 0 {
            tracing::warn!(id, "no saved query to increment");
        } else {
            tracing::debug!(id, "incremented saved query usage");
        }
        Ok(())
    }

    /// Entries whose description or path contains `term`, case-insensitively. Most used first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn search(&self, term: &str) -> Result<Vec<SavedQuery>> {
        let rows = sqlx::query_as::<_, SavedQuery>(&format!(
            r#"
select {COLUMNS}
from saved_queries
where description ilike $1 or path ilike $1
order by usage_count desc, "timestamp" desc, id desc
"#
        ))
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Every entry, most used first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<SavedQuery>> {
        let rows = sqlx::query_as::<_, SavedQuery>(&format!(
            r#"select {COLUMNS} from saved_queries order by usage_count desc, "timestamp" desc, id desc"#
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let affected = sqlx::query("delete from saved_queries where id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected > 0 {
            tracing::info!(id, "deleted saved query");
        }
        Ok(affected > 0)
    }

    /// Remove every entry and return how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn clear_all(&self) -> Result<u64> {
        let removed = sqlx::query("delete from saved_queries")
            .execute(&self.pool)
            .await?
            .rows_affected();
        tracing::info!(removed, "cleared saved queries");
        Ok(removed)
    }

    /// Look up the entry for (path, method) and count this use of it.
    ///
    /// The returned row reflects the increment.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn lookup_and_touch(&self, path: &str, method: &str) -> Result<Option<SavedQuery>> {
        let (path, method) = canonical_key(path, method);
        let row = sqlx::query_as::<_, SavedQuery>(&format!(
            r#"
update saved_queries
set usage_count = usage_count + 1,
    "timestamp" = extract(epoch from now())::bigint
where path = $1 and method = $2
returning {COLUMNS}
"#
        ))
        .bind(&path)
        .bind(&method)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(row) = &row {
            tracing::debug!(id = row.id, usage_count = row.usage_count, "saved query hit");
        }
        Ok(row)
    }
}
