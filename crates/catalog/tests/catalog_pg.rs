use anyhow::Context as _;
use apigw_catalog::search::MAX_RESULTS;
use apigw_catalog::{CatalogConfig, CatalogStore, Payload, Resolver, SearchEngine, migrate};
use apigw_test_support::start_postgres;
use sqlx::PgPool;

async fn insert_endpoint(
    pool: &PgPool,
    path: &str,
    method: &str,
    category: &str,
    summary: &str,
) -> anyhow::Result<i32> {
    let id = sqlx::query_scalar::<_, i32>(
        r"
insert into endpoints (path, method, category, summary, description, tags)
values ($1, $2, $3, $4, $4 || ' (' || $1 || ')', lower($3))
returning id
",
    )
    .bind(path)
    .bind(method)
    .bind(category)
    .bind(summary)
    .fetch_one(pool)
    .await
    .with_context(|| format!("insert {method} {path}"))?;
    Ok(id)
}

async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    insert_endpoint(pool, "/service/tickets", "get", "Service", "List service tickets").await?;
    let ticket =
        insert_endpoint(pool, "/service/tickets/{id}", "get", "Service", "Get a ticket").await?;
    insert_endpoint(
        pool,
        "/service/tickets/{parentId}/notes",
        "get",
        "Service",
        "List ticket notes",
    )
    .await?;
    insert_endpoint(
        pool,
        "/company/companies/{id}/notes",
        "get",
        "Company",
        "Company notes",
    )
    .await?;
    insert_endpoint(
        pool,
        "/company/companies/{companyId}/notes",
        "get",
        "Company",
        "Company notes by company id",
    )
    .await?;
    insert_endpoint(
        pool,
        "/system/oauth2token/{id}",
        "get",
        "System",
        "Read an oauth token",
    )
    .await?;
    for n in 0..60 {
        insert_endpoint(
            pool,
            &format!("/bulk/widgets{n}"),
            "get",
            "Bulk",
            "Bulk widget listing",
        )
        .await?;
    }

    sqlx::query(
        r"
insert into parameters (endpoint_id, name, location, required, type, description)
values ($1, 'id', 'path', true, 'integer', 'Ticket id'),
       ($1, 'fields', 'query', false, 'string', null)
",
    )
    .bind(ticket)
    .execute(pool)
    .await?;
    sqlx::query(
        r#"
insert into response_bodies (endpoint_id, status_code, description, schema, example)
values ($1, '200', 'OK', '{"type":"object"}', '{"id":1}'),
       ($1, '404', 'Missing', null, 'ticket not found'),
       ($1, '200', 'Shadowed', null, '{"id":2}'),
       ($1, null, 'Fallback', null, '')
"#,
    )
    .bind(ticket)
    .execute(pool)
    .await?;
    sqlx::query("insert into request_bodies (endpoint_id, schema, example) values ($1, '{bad', null)")
        .bind(ticket)
        .execute(pool)
        .await?;
    Ok(())
}

async fn index_search_vectors(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r"
update endpoints
set search_vector = to_tsvector(
  'english',
  coalesce(path, '') || ' ' || coalesce(summary, '') || ' ' || coalesce(description, '')
)
",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn setup(db: &str) -> anyhow::Result<(apigw_test_support::PgServer, PgPool)> {
    let pg = start_postgres().await?;
    let url = pg.create_database(db).await?;
    let pool = CatalogConfig::new(url).connect().await?;
    migrate::apply_migrations(&pool).await?;
    seed(&pool).await?;
    Ok((pg, pool))
}

#[tokio::test]
#[ignore = "requires Docker (testcontainers)"]
async fn resolver_matches_exact_and_structural_paths() -> anyhow::Result<()> {
    let (_pg, pool) = setup("resolver").await?;
    let resolver = Resolver::new(CatalogStore::new(pool.clone()));

    // Every catalog entry resolves to itself.
    let rows: Vec<(i32, String, String)> = sqlx::query_as("select id, path, method from endpoints")
        .fetch_all(&pool)
        .await?;
    for (id, path, method) in rows {
        let detail = resolver.resolve(&path, &method).await?.context("exact match")?;
        assert_eq!(detail.endpoint.id, id);
    }

    let detail = resolver
        .resolve("service/tickets/123/notes/", "GET")
        .await?
        .context("structural match")?;
    assert_eq!(detail.endpoint.path, "/service/tickets/{parentId}/notes");

    // Tie between two placeholder spellings goes to the smaller path.
    let detail = resolver
        .resolve("/company/companies/42/notes", "get")
        .await?
        .context("tie-break")?;
    assert_eq!(detail.endpoint.path, "/company/companies/{companyId}/notes");

    // A value-looking segment that the catalog uses literally is kept.
    let detail = resolver
        .resolve("/system/oauth2token/77", "get")
        .await?
        .context("literal segment")?;
    assert_eq!(detail.endpoint.path, "/system/oauth2token/{id}");
    assert_eq!(resolver.literal_cache().get("oauth2token"), Some(true));

    // Literal segments are recognized regardless of case, like exact matches.
    let detail = resolver
        .resolve("/System/OAUTH2TOKEN/7", "GET")
        .await?
        .context("mixed-case literal segment")?;
    assert_eq!(detail.endpoint.path, "/system/oauth2token/{id}");
    assert_eq!(resolver.literal_cache().get("OAUTH2TOKEN"), Some(true));

    assert!(resolver.resolve("/service/tickets/123", "delete").await?.is_none());
    assert!(resolver.resolve("/nowhere/at/all", "get").await?.is_none());
    Ok(())
}

#[tokio::test]
#[ignore = "requires Docker (testcontainers)"]
async fn hydration_keeps_undecodable_documents() -> anyhow::Result<()> {
    let (_pg, pool) = setup("hydration").await?;
    let resolver = Resolver::new(CatalogStore::new(pool));

    let detail = resolver
        .resolve("/service/tickets/9", "get")
        .await?
        .context("ticket endpoint")?;
    assert_eq!(
        detail.parameters.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        vec!["id", "fields"]
    );
    assert!(detail.parameters[0].is_required());

    let body = detail.request_body.context("request body")?;
    assert_eq!(body.schema, Some(Payload::Raw("{bad".into())));
    assert_eq!(body.example, None);

    assert_eq!(detail.response_bodies["200"].description.as_deref(), Some("OK"));
    assert_eq!(
        detail.response_bodies["404"].example,
        Some(Payload::Raw("ticket not found".into()))
    );
    assert!(detail.response_bodies["default"].example.is_none());

    let param = resolver
        .parameter(detail.endpoint.id, "fields")
        .await?
        .context("named parameter")?;
    assert!(!param.is_required());
    Ok(())
}

#[tokio::test]
#[ignore = "requires Docker (testcontainers)"]
async fn search_degrades_without_ranking_index() -> anyhow::Result<()> {
    let (_pg, pool) = setup("degrade").await?;
    let engine = SearchEngine::new(CatalogStore::new(pool.clone()));

    assert!(!engine.ranking_available().await);
    let hits = engine.natural_language_search("show me the ticket notes", 10).await?;
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| h.rank.is_none()));
    // Summary matches on the first keyword sort ahead of description-only matches.
    assert_eq!(hits[0].summary.as_deref(), Some("List service tickets"));

    index_search_vectors(&pool).await?;
    assert!(engine.ranking_available().await);
    let hits = engine.natural_language_search("ticket notes", 10).await?;
    assert_eq!(hits[0].path, "/service/tickets/{parentId}/notes");
    assert!(hits[0].rank.is_some());

    let hits = engine.advanced_search("oauth token", 5, true).await?;
    assert_eq!(hits[0].path, "/system/oauth2token/{id}");
    assert!(hits[0].summary_highlight.as_deref().is_some_and(|h| h.contains("<b>")));
    Ok(())
}

#[tokio::test]
#[ignore = "requires Docker (testcontainers)"]
async fn result_limits_and_categories() -> anyhow::Result<()> {
    let (_pg, pool) = setup("limits").await?;
    let engine = SearchEngine::new(CatalogStore::new(pool.clone()));

    let hits = engine.natural_language_search("widget", 500).await?;
    assert_eq!(hits.len(), usize::try_from(MAX_RESULTS)?);
    assert_eq!(engine.natural_language_search("widget", 0).await?.len(), 1);

    let hits = engine.search("widget").await?;
    assert_eq!(hits.len(), usize::try_from(MAX_RESULTS)?);
    let total: i64 = sqlx::query_scalar("select count(*) from endpoints")
        .fetch_one(&pool)
        .await?;
    let hits = engine.search("").await?;
    assert_eq!(hits.len(), usize::try_from(total.min(MAX_RESULTS))?);
    assert_eq!(hits.first().and_then(|h| h.category.as_deref()), Some("Bulk"));

    let hits = engine.search("notes").await?;
    assert_eq!(hits.first().and_then(|h| h.category.as_deref()), Some("Company"));

    assert_eq!(
        engine.list_categories().await?,
        vec!["Bulk", "Company", "Service", "System"]
    );
    let service = engine.endpoints_by_category("Service").await?;
    assert_eq!(
        service.iter().map(|h| h.path.as_str()).collect::<Vec<_>>(),
        vec![
            "/service/tickets",
            "/service/tickets/{id}",
            "/service/tickets/{parentId}/notes"
        ]
    );
    assert!(engine.endpoints_by_category("Nope").await?.is_empty());
    Ok(())
}
