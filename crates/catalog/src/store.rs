//! Read-only access to the catalog tables.
//!
//! The catalog is written by the importer and never mutated while serving, so nothing here
//! takes locks. Multi-statement reads run in one transaction so a hydrated endpoint is a
//! consistent snapshot.

use crate::error::Result;
use crate::model::{
    DEFAULT_STATUS_KEY, EndpointDetail, EndpointHit, EndpointRow, Parameter, Payload, RequestBody,
    ResponseBody,
};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::BTreeMap;

#[derive(Debug, sqlx::FromRow)]
struct StoredBody {
    id: i32,
    #[sqlx(default)]
    status_code: Option<String>,
    #[sqlx(default)]
    description: Option<String>,
    schema: Option<String>,
    example: Option<String>,
}

/// A catalog row that shares a method with the caller, used for structural matching.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PathCandidate {
    pub id: i32,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct CatalogStore {
    pool: PgPool,
}

impl CatalogStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Case-insensitive exact lookup on (path, method).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_exact(&self, path: &str, method: &str) -> Result<Option<i32>> {
        let id = sqlx::query_scalar::<_, i32>(
            r"
select id
from endpoints
where lower(path) = lower($1)
  and lower(method) = lower($2)
order by path, id
limit 1
",
        )
        .bind(path)
        .bind(method)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    /// All catalog paths registered for `method`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn paths_for_method(&self, method: &str) -> Result<Vec<PathCandidate>> {
        let rows = sqlx::query_as::<_, PathCandidate>(
            r"
select id, path
from endpoints
where lower(method) = lower($1)
order by path, id
",
        )
        .bind(method)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Whether `segment` occurs as a whole `/`-separated component of any catalog path,
    /// ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn is_literal_segment(&self, segment: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
select exists (
  select 1 from endpoints
  where lower($1) = any (string_to_array(lower(path), '/'))
)
",
        )
        .bind(segment)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Whether the precomputed ranking index exists and is populated.
    ///
    /// # Errors
    ///
    /// Returns an error if the probe queries fail.
    pub async fn has_ranking_index(&self) -> Result<bool> {
        let column = sqlx::query_scalar::<_, bool>(
            r"
select exists (
  select 1 from information_schema.columns
  where table_name = 'endpoints' and column_name = 'search_vector'
)
",
        )
        .fetch_one(&self.pool)
        .await?;
        if !column {
            return Ok(false);
        }

        let populated = sqlx::query_scalar::<_, bool>(
            "select exists (select 1 from endpoints where search_vector is not null)",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(populated)
    }

    /// Hydrate a catalog entry with its parameters and bodies.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the reads fail. Undecodable stored documents are not errors.
    pub async fn endpoint_detail(&self, id: i32) -> Result<Option<EndpointDetail>> {
        let mut tx = self.pool.begin().await?;
        let detail = hydrate(&mut tx, id).await?;
        tx.commit().await?;
        Ok(detail)
    }

    /// A single named parameter of an endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn parameter(&self, endpoint_id: i32, name: &str) -> Result<Option<Parameter>> {
        let row = sqlx::query_as::<_, Parameter>(
            r"
select id, endpoint_id, name, location, required, type, description
from parameters
where endpoint_id = $1 and name = $2
order by id
limit 1
",
        )
        .bind(endpoint_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Distinct category names, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            "select distinct category from endpoints where category is not null order by category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Endpoints in `category`, ordered by path.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn endpoints_by_category(&self, category: &str) -> Result<Vec<EndpointHit>> {
        let rows = sqlx::query_as::<_, EndpointHit>(
            r"
select id, path, method, description, category, tags, summary
from endpoints
where category = $1
order by path, method
",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

async fn hydrate(tx: &mut Transaction<'_, Postgres>, id: i32) -> Result<Option<EndpointDetail>> {
    let Some(endpoint) = sqlx::query_as::<_, EndpointRow>(
        r"
select id, path, method, description, category, summary, tags, keywords
from endpoints
where id = $1
",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    else {
        return Ok(None);
    };

    let parameters = sqlx::query_as::<_, Parameter>(
        r"
select id, endpoint_id, name, location, required, type, description
from parameters
where endpoint_id = $1
order by id
",
    )
    .bind(id)
    .fetch_all(&mut **tx)
    .await?;

    let request_body = sqlx::query_as::<_, StoredBody>(
        r"
select id, schema, example
from request_bodies
where endpoint_id = $1
order by id
limit 1
",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .map(|b| RequestBody {
        id: b.id,
        schema: Payload::from_stored(b.schema),
        example: Payload::from_stored(b.example),
    });

    let responses = sqlx::query_as::<_, StoredBody>(
        r"
select id, status_code, description, schema, example
from response_bodies
where endpoint_id = $1
order by id
",
    )
    .bind(id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(Some(EndpointDetail {
        endpoint,
        parameters,
        request_body,
        response_bodies: key_by_status(responses),
    }))
}

// Rows arrive ordered by id, so the first row for a status code wins.
fn key_by_status(rows: Vec<StoredBody>) -> BTreeMap<String, ResponseBody> {
    let mut out = BTreeMap::new();
    for row in rows {
        let key = row
            .status_code
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STATUS_KEY.to_string());
        out.entry(key).or_insert_with(|| ResponseBody {
            id: row.id,
            status_code: row.status_code,
            description: row.description,
            schema: Payload::from_stored(row.schema),
            example: Payload::from_stored(row.example),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(id: i32, status: Option<&str>, example: &str) -> StoredBody {
        StoredBody {
            id,
            status_code: status.map(str::to_string),
            description: None,
            schema: None,
            example: Some(example.to_string()),
        }
    }

    #[test]
    fn responses_are_keyed_by_status_with_first_row_winning() {
        let map = key_by_status(vec![
            body(1, Some("200"), r#"{"ok":true}"#),
            body(2, Some("404"), "not found"),
            body(3, Some("200"), r#"{"ok":false}"#),
            body(4, None, "{}"),
        ]);
        assert_eq!(
            map.keys().collect::<Vec<_>>(),
            vec!["200", "404", DEFAULT_STATUS_KEY]
        );
        assert_eq!(map["200"].id, 1);
        assert_eq!(map["200"].example, Some(Payload::Json(json!({"ok": true}))));
        assert_eq!(map["404"].example, Some(Payload::Raw("not found".into())));
    }
}
