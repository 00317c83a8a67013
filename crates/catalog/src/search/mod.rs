//! Free-text search over the catalog.
//!
//! Every search operation is an ordered list of [`SearchTier`]s run by a [`TierCascade`]: the
//! first tier that returns rows answers the query. A failing tier other than the last one is
//! logged and treated as "no rows", so a broken or missing full-text index degrades the search
//! instead of failing it. The last tier's errors are returned to the caller.
//!
//! A tier added with [`TierCascade::on_error`] is a recovery step: it runs only when the tier
//! before it failed, and is skipped when that tier merely found nothing.

pub mod keywords;
pub mod tiers;

use crate::error::{CatalogError, Result};
use crate::model::EndpointHit;
use crate::store::CatalogStore;
use async_trait::async_trait;
use tiers::{QueryParser, RankFunction, RankedTier, SubstringOrder, SubstringTier, Terms};

/// Upper bound on rows returned by any search.
pub const MAX_RESULTS: i64 = 50;

/// Longest accepted natural-language query, in characters.
pub const MAX_QUERY_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: i64,
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: impl Into<String>, limit: i64) -> Self {
        Self {
            query: query.into(),
            limit,
        }
    }
}

/// One strategy in a search cascade.
#[async_trait]
pub trait SearchTier: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Run the strategy. An empty `Vec` means "no rows, try the next tier".
    async fn attempt(&self, request: &SearchRequest) -> Result<Vec<EndpointHit>>;
}

/// Result of running a cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeOutcome {
    /// Tier that produced the rows; `None` when every tier came back empty.
    pub answered_by: Option<&'static str>,
    pub hits: Vec<EndpointHit>,
}

/// When a tier in a cascade gets to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Whenever no earlier tier produced rows.
    NoRows,
    /// Only when the preceding tier returned an error.
    PreviousFailed,
}

struct Step {
    tier: Box<dyn SearchTier>,
    trigger: Trigger,
}

#[derive(Default)]
pub struct TierCascade {
    steps: Vec<Step>,
}

impl TierCascade {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(self, tier: impl SearchTier + 'static) -> Self {
        self.push(tier, Trigger::NoRows)
    }

    /// Add a tier that only runs when the tier before it failed.
    #[must_use]
    pub fn on_error(self, tier: impl SearchTier + 'static) -> Self {
        self.push(tier, Trigger::PreviousFailed)
    }

    fn push(mut self, tier: impl SearchTier + 'static, trigger: Trigger) -> Self {
        self.steps.push(Step {
            tier: Box::new(tier),
            trigger,
        });
        self
    }

    #[must_use]
    pub fn tier_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.tier.name()).collect()
    }

    #[must_use]
    pub fn triggers(&self) -> Vec<Trigger> {
        self.steps.iter().map(|s| s.trigger).collect()
    }

    /// Try each tier in order until one returns rows.
    ///
    /// # Errors
    ///
    /// Only the final tier's error is returned; earlier failures are logged and skipped.
    pub async fn run(&self, request: &SearchRequest) -> Result<CascadeOutcome> {
        let last = self.steps.len().saturating_sub(1);
        let mut previous_failed = false;
        for (idx, step) in self.steps.iter().enumerate() {
            let tier = &step.tier;
            if step.trigger == Trigger::PreviousFailed && !previous_failed {
                tracing::debug!(tier = tier.name(), "previous tier succeeded; skipping recovery tier");
                continue;
            }
            previous_failed = false;
            let hits = match tier.attempt(request).await {
                Ok(hits) => hits,
                Err(e) if idx < last => {
                    tracing::warn!(tier = tier.name(), error = %e, "search tier failed; falling back");
                    previous_failed = true;
                    continue;
                }
                Err(e) => return Err(e),
            };
            if !hits.is_empty() {
                tracing::debug!(tier = tier.name(), rows = hits.len(), "search tier answered");
                return Ok(CascadeOutcome {
                    answered_by: Some(tier.name()),
                    hits,
                });
            }
            tracing::debug!(tier = tier.name(), "search tier returned no rows");
        }
        Ok(CascadeOutcome {
            answered_by: None,
            hits: Vec::new(),
        })
    }
}

/// Clamp a caller-supplied result limit into `1..=MAX_RESULTS`.
#[must_use]
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_RESULTS)
}

#[derive(Debug, Clone)]
pub struct SearchEngine {
    store: CatalogStore,
}

impl SearchEngine {
    #[must_use]
    pub fn new(store: CatalogStore) -> Self {
        Self { store }
    }

    /// Whether the ranked tiers can be used for this call.
    pub async fn ranking_available(&self) -> bool {
        match self.store.has_ranking_index().await {
            Ok(available) => available,
            Err(e) => {
                tracing::warn!(error = %e, "ranking index probe failed; using substring search");
                false
            }
        }
    }

    /// General search: ranked when possible, otherwise (or on zero rows) a substring match
    /// ordered by category and path. At most [`MAX_RESULTS`] rows; a blank query lists the
    /// first [`MAX_RESULTS`] entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the substring fallback cannot reach storage.
    pub async fn search(&self, query: &str) -> Result<Vec<EndpointHit>> {
        let ranking = self.ranking_available().await;
        let request = SearchRequest::new(query, MAX_RESULTS);
        Ok(self.search_cascade(ranking).run(&request).await?.hits)
    }

    /// Natural-language search: phrase-aware ranking, then plain ranking, then keywords.
    ///
    /// Blank queries return nothing. `limit` is clamped to `1..=50`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidQuery`] for queries over [`MAX_QUERY_CHARS`] characters,
    /// or a storage error if the keyword fallback fails.
    pub async fn natural_language_search(&self, query: &str, limit: i64) -> Result<Vec<EndpointHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        if query.chars().count() > MAX_QUERY_CHARS {
            return Err(CatalogError::InvalidQuery(format!(
                "query longer than {MAX_QUERY_CHARS} characters"
            )));
        }
        let ranking = self.ranking_available().await;
        let request = SearchRequest::new(query.to_lowercase(), clamp_limit(limit));
        Ok(self.natural_language_cascade(ranking).run(&request).await?.hits)
    }

    /// Ranked search with optional highlighted snippets. Plain ranking is tried only when the
    /// highlighted tier fails; an empty ranked answer goes straight to a whole-query substring
    /// match.
    ///
    /// # Errors
    ///
    /// Returns an error if the substring fallback cannot reach storage.
    pub async fn advanced_search(
        &self,
        query: &str,
        limit: i64,
        include_highlights: bool,
    ) -> Result<Vec<EndpointHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let ranking = self.ranking_available().await;
        let request = SearchRequest::new(query, clamp_limit(limit));
        Ok(self
            .advanced_cascade(ranking, include_highlights)
            .run(&request)
            .await?
            .hits)
    }

    /// Distinct category names, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if storage is unavailable.
    pub async fn list_categories(&self) -> Result<Vec<String>> {
        self.store.list_categories().await
    }

    /// All endpoints of a category, ordered by path.
    ///
    /// # Errors
    ///
    /// Returns an error if storage is unavailable.
    pub async fn endpoints_by_category(&self, category: &str) -> Result<Vec<EndpointHit>> {
        self.store.endpoints_by_category(category).await
    }

    fn search_cascade(&self, ranking: bool) -> TierCascade {
        let pool = self.store.pool().clone();
        let mut cascade = TierCascade::new();
        if ranking {
            cascade = cascade.then(RankedTier::new(
                pool.clone(),
                QueryParser::WebSearch,
                RankFunction::Frequency,
            ));
        }
        cascade.then(SubstringTier::new(
            pool,
            Terms::WholeQuery,
            SubstringOrder::CategoryPath,
        ))
    }

    fn natural_language_cascade(&self, ranking: bool) -> TierCascade {
        let pool = self.store.pool().clone();
        let mut cascade = TierCascade::new();
        if ranking {
            cascade = cascade
                .then(RankedTier::new(
                    pool.clone(),
                    QueryParser::WebSearch,
                    RankFunction::CoverDensity,
                ))
                .then(RankedTier::new(
                    pool.clone(),
                    QueryParser::Plain,
                    RankFunction::Frequency,
                ));
        }
        cascade.then(SubstringTier::new(
            pool,
            Terms::Keywords,
            SubstringOrder::FieldPriority,
        ))
    }

    fn advanced_cascade(&self, ranking: bool, include_highlights: bool) -> TierCascade {
        let pool = self.store.pool().clone();
        let mut cascade = TierCascade::new();
        if ranking {
            cascade = cascade
                .then(
                    RankedTier::new(pool.clone(), QueryParser::WebSearch, RankFunction::CoverDensity)
                        .with_highlights(include_highlights),
                )
                .on_error(RankedTier::new(
                    pool.clone(),
                    QueryParser::Plain,
                    RankFunction::Frequency,
                ));
        }
        cascade.then(SubstringTier::new(
            pool,
            Terms::WholeQuery,
            SubstringOrder::FieldPriority,
        ))
    }
}
