//! Postgres-backed search tiers.

use super::keywords::{contains_pattern, keywords};
use super::{SearchRequest, SearchTier};
use crate::error::Result;
use crate::model::EndpointHit;
use async_trait::async_trait;
use sqlx::PgPool;

/// How the query text is turned into a `tsquery`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryParser {
    /// `websearch_to_tsquery`: quoted phrases, `or`, `-negation`.
    WebSearch,
    /// `plainto_tsquery`: every word ANDed, no operators.
    Plain,
}

impl QueryParser {
    fn sql_fn(self) -> &'static str {
        match self {
            QueryParser::WebSearch => "websearch_to_tsquery",
            QueryParser::Plain => "plainto_tsquery",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankFunction {
    /// `ts_rank_cd`: cover density, rewards terms appearing close together.
    CoverDensity,
    /// `ts_rank`: term frequency.
    Frequency,
}

impl RankFunction {
    fn sql_fn(self) -> &'static str {
        match self {
            RankFunction::CoverDensity => "ts_rank_cd",
            RankFunction::Frequency => "ts_rank",
        }
    }
}

/// Full-text tier over the precomputed `search_vector`.
#[derive(Debug, Clone)]
pub struct RankedTier {
    pool: PgPool,
    parser: QueryParser,
    rank: RankFunction,
    highlights: bool,
}

impl RankedTier {
    #[must_use]
    pub fn new(pool: PgPool, parser: QueryParser, rank: RankFunction) -> Self {
        Self {
            pool,
            parser,
            rank,
            highlights: false,
        }
    }

    /// Also return `ts_headline` snippets for summary and description.
    #[must_use]
    pub fn with_highlights(mut self, highlights: bool) -> Self {
        self.highlights = highlights;
        self
    }

    fn sql(&self) -> String {
        let tsquery = format!("{}('english', $1)", self.parser.sql_fn());
        let highlight_cols = if self.highlights {
            format!(
                ",\n       ts_headline('english', coalesce(summary, ''), {tsquery}) as summary_highlight,\
                 \n       ts_headline('english', coalesce(description, ''), {tsquery}) as description_highlight"
            )
        } else {
            String::new()
        };
        format!(
            r"
select id, path, method, description, category, tags, summary,
       {rank}(search_vector, {tsquery}) as rank{highlight_cols}
from endpoints
where search_vector @@ {tsquery}
order by rank desc, category, path, method
limit $2
",
            rank = self.rank.sql_fn(),
        )
    }
}

#[async_trait]
impl SearchTier for RankedTier {
    fn name(&self) -> &'static str {
        match (self.parser, self.highlights) {
            (QueryParser::WebSearch, true) => "websearch+highlights",
            (QueryParser::WebSearch, false) => "websearch",
            (QueryParser::Plain, _) => "plain",
        }
    }

    async fn attempt(&self, request: &SearchRequest) -> Result<Vec<EndpointHit>> {
        let rows = sqlx::query_as::<_, EndpointHit>(&self.sql())
            .bind(&request.query)
            .bind(request.limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

/// Which substring terms a [`SubstringTier`] matches with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terms {
    /// Each surviving keyword of the query; see [`keywords`].
    Keywords,
    /// The whole trimmed query as one term. A blank query matches every row.
    WholeQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstringOrder {
    /// Rows whose summary contains the first term come first, then description, path, tags.
    FieldPriority,
    /// Alphabetical by category, then path.
    CategoryPath,
}

/// Case-insensitive substring match over path, description, tags and summary.
#[derive(Debug, Clone)]
pub struct SubstringTier {
    pool: PgPool,
    terms: Terms,
    order: SubstringOrder,
}

impl SubstringTier {
    #[must_use]
    pub fn new(pool: PgPool, terms: Terms, order: SubstringOrder) -> Self {
        Self { pool, terms, order }
    }

    fn patterns(&self, query: &str) -> Vec<String> {
        match self.terms {
            Terms::Keywords => keywords(query).iter().map(|k| contains_pattern(k)).collect(),
            Terms::WholeQuery => vec![contains_pattern(query.trim())],
        }
    }

    fn sql(&self) -> &'static str {
        match self.order {
            SubstringOrder::FieldPriority => {
                r"
select id, path, method, description, category, tags, summary
from endpoints
where path ilike any ($1)
   or description ilike any ($1)
   or tags ilike any ($1)
   or summary ilike any ($1)
order by
  case
    when summary ilike $2 then 1
    when description ilike $2 then 2
    when path ilike $2 then 3
    when tags ilike $2 then 4
    else 5
  end,
  path, method
limit $3
"
            }
            SubstringOrder::CategoryPath => {
                r"
select id, path, method, description, category, tags, summary
from endpoints
where path ilike any ($1)
   or description ilike any ($1)
   or tags ilike any ($1)
   or summary ilike any ($1)
order by category, path, method
limit $2
"
            }
        }
    }
}

#[async_trait]
impl SearchTier for SubstringTier {
    fn name(&self) -> &'static str {
        match (self.terms, self.order) {
            (Terms::Keywords, _) => "keywords",
            (Terms::WholeQuery, SubstringOrder::FieldPriority) => "substring",
            (Terms::WholeQuery, SubstringOrder::CategoryPath) => "substring-by-category",
        }
    }

    async fn attempt(&self, request: &SearchRequest) -> Result<Vec<EndpointHit>> {
        let patterns = self.patterns(&request.query);
        let Some(first) = patterns.first().cloned() else {
            return Ok(Vec::new());
        };
        let mut query = sqlx::query_as::<_, EndpointHit>(self.sql()).bind(patterns);
        if self.order == SubstringOrder::FieldPriority {
            query = query.bind(first);
        }
        let rows = query.bind(request.limit).fetch_all(&self.pool).await?;
        Ok(rows)
    }
}
