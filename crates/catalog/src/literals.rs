//! Memo of which value-looking path segments the catalog uses literally.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Process-local memo of "is this text a literal route segment somewhere in the catalog?".
///
/// The catalog does not change while serving, so an answer never goes stale. Two callers may
/// race to fill the same key; both compute the same answer, so the second write is harmless.
#[derive(Clone, Default)]
pub struct LiteralSegmentCache {
    inner: Arc<RwLock<HashMap<String, bool>>>,
}

impl LiteralSegmentCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated cache, e.g. from a full scan of catalog paths.
    #[must_use]
    pub fn with_known<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let map = literals.into_iter().map(|s| (s.into(), true)).collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    #[must_use]
    pub fn get(&self, segment: &str) -> Option<bool> {
        self.inner.read().get(segment).copied()
    }

    pub fn insert(&self, segment: &str, is_literal: bool) {
        self.inner.write().insert(segment.to_string(), is_literal);
    }

    /// `true` only for segments already memoized as literals.
    #[must_use]
    pub fn is_known_literal(&self, segment: &str) -> bool {
        self.get(segment).unwrap_or(false)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
