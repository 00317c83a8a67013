//! Map a caller-supplied (path, method) onto a documented catalog entry.
//!
//! Resolution order:
//! 1. exact, case-insensitive match on the normalized path;
//! 2. structural match: the caller path is parameterized (value-like segments become `{id}`)
//!    and both sides are genericized so placeholder names do not matter;
//! 3. not found.
//!
//! When several catalog paths share a generic pattern, [`pick_candidate`] breaks the tie.

use crate::error::Result;
use crate::literals::LiteralSegmentCache;
use crate::model::{EndpointDetail, Parameter};
use crate::paths::{self, GENERIC_MARKER};
use crate::store::{CatalogStore, PathCandidate};

#[derive(Clone)]
pub struct Resolver {
    store: CatalogStore,
    literals: LiteralSegmentCache,
}

impl Resolver {
    #[must_use]
    pub fn new(store: CatalogStore) -> Self {
        Self::with_cache(store, LiteralSegmentCache::new())
    }

    #[must_use]
    pub fn with_cache(store: CatalogStore, literals: LiteralSegmentCache) -> Self {
        Self { store, literals }
    }

    #[must_use]
    pub fn literal_cache(&self) -> &LiteralSegmentCache {
        &self.literals
    }

    /// Resolve (path, method) to a hydrated catalog entry.
    ///
    /// # Errors
    ///
    /// Returns an error only if storage is unavailable; "no match" is `Ok(None)`.
    pub async fn resolve(&self, path: &str, method: &str) -> Result<Option<EndpointDetail>> {
        let normalized = paths::normalize(path);
        let method = method.trim().to_ascii_lowercase();

        if let Some(id) = self.store.find_exact(&normalized, &method).await? {
            tracing::debug!(path = %normalized, %method, id, "resolved by exact match");
            return self.store.endpoint_detail(id).await;
        }

        let parameterized = self.parameterize(&normalized).await;
        let pattern = paths::genericize(&parameterized);
        if !pattern.contains(GENERIC_MARKER) {
            tracing::debug!(path = %normalized, %method, "no exact match and nothing to generalize");
            return Ok(None);
        }

        let candidates = self.store.paths_for_method(&method).await?;
        let Some(hit) = pick_candidate(&pattern, &candidates) else {
            tracing::debug!(path = %normalized, %pattern, %method, "no structural match");
            return Ok(None);
        };
        tracing::debug!(
            path = %normalized,
            %pattern,
            matched = %hit.path,
            id = hit.id,
            "resolved by structural match"
        );
        self.store.endpoint_detail(hit.id).await
    }

    /// Hydrate a catalog entry by id.
    ///
    /// # Errors
    ///
    /// Returns an error if storage is unavailable.
    pub async fn endpoint_detail(&self, id: i32) -> Result<Option<EndpointDetail>> {
        self.store.endpoint_detail(id).await
    }

    /// Look up one parameter of an endpoint by name.
    ///
    /// # Errors
    ///
    /// Returns an error if storage is unavailable.
    pub async fn parameter(&self, endpoint_id: i32, name: &str) -> Result<Option<Parameter>> {
        self.store.parameter(endpoint_id, name).await
    }

    /// Parameterize `path`, consulting the catalog for segments the cache has not seen yet.
    pub async fn parameterize(&self, path: &str) -> String {
        for segment in paths::segments(path) {
            if paths::is_placeholder(segment) || !paths::looks_like_value(segment) {
                // Classification does not depend on the catalog for these.
                continue;
            }
            if self.literals.get(segment).is_some() {
                continue;
            }
            match self.store.is_literal_segment(segment).await {
                Ok(is_literal) => self.literals.insert(segment, is_literal),
                Err(e) => {
                    tracing::warn!(error = %e, %segment, "literal segment lookup failed; treating as value");
                }
            }
        }
        paths::parameterize(path, |s| self.literals.is_known_literal(s))
    }
}

/// Choose among catalog paths whose generic form equals `pattern`.
///
/// Literal segments compare case-insensitively. Preference: fewest placeholder segments, then
/// the lexicographically smallest path, then the lowest id. The result does not depend on the
/// order of `candidates`.
#[must_use]
pub fn pick_candidate<'a>(pattern: &str, candidates: &'a [PathCandidate]) -> Option<&'a PathCandidate> {
    candidates
        .iter()
        .filter(|c| paths::genericize(&c.path).eq_ignore_ascii_case(pattern))
        .min_by(|a, b| {
            paths::placeholder_count(&a.path)
                .cmp(&paths::placeholder_count(&b.path))
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.id.cmp(&b.id))
        })
}
