//! Path canonicalization and segment classification.
//!
//! Callers hand us paths in whatever shape they have them: concrete ids (`/service/tickets/123`),
//! doubled slashes, trailing slashes, or templated forms whose placeholder names differ from the
//! catalog (`{id}` vs `{parentId}`). These helpers reduce all of that to forms that can be
//! compared against catalog paths:
//!
//! - [`normalize`] fixes slashes only.
//! - [`parameterize`] replaces segments that look like values with [`ID_MARKER`].
//! - [`genericize`] replaces every `{...}` placeholder with [`GENERIC_MARKER`].

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Placeholder substituted for segments classified as parameter values.
pub const ID_MARKER: &str = "{id}";

/// Canonical placeholder used for structural comparison.
pub const GENERIC_MARKER: &str = "{param}";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]+\}").expect("placeholder regex compiles"));

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$")
        .expect("uuid regex compiles")
});

// Business identifiers such as `INV-2023-001` or `TKT-42`.
static PREFIXED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,4}-[A-Za-z0-9_-]+$").expect("prefixed id regex compiles"));

static BASE64ISH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+/=_-]+$").expect("base64 regex compiles"));

/// Collapse repeated slashes, force a single leading slash and drop a trailing slash.
///
/// Empty (or whitespace-only) input normalizes to `/`.
#[must_use]
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for segment in segments(path.trim()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Non-empty `/`-separated segments of `path`.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Whether a segment is already a template placeholder (`{name}`).
#[must_use]
pub fn is_placeholder(segment: &str) -> bool {
    segment.len() > 2 && segment.starts_with('{') && segment.ends_with('}')
}

/// Number of placeholder segments in `path`.
#[must_use]
pub fn placeholder_count(path: &str) -> usize {
    segments(path).filter(|s| is_placeholder(s)).count()
}

/// Heuristic check for segments that carry a value rather than name a route.
///
/// This does not consult the catalog; see [`classify_segment`] for the full rule.
#[must_use]
pub fn looks_like_value(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    if segment.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    if UUID.is_match(segment) || PREFIXED_ID.is_match(segment) {
        return true;
    }
    if segment.len() >= 8
        && segment.bytes().all(|b| b.is_ascii_alphanumeric())
        && segment.bytes().any(|b| b.is_ascii_digit())
        && segment.bytes().any(|b| b.is_ascii_alphabetic())
    {
        return true;
    }
    segment.len() >= 10 && BASE64ISH.is_match(segment)
}

/// Classify one segment.
///
/// Known catalog literals and existing placeholders are returned unchanged; anything else that
/// [`looks_like_value`] becomes [`ID_MARKER`].
pub fn classify_segment<'a>(segment: &'a str, is_literal: impl Fn(&str) -> bool) -> Cow<'a, str> {
    if is_placeholder(segment) || is_literal(segment) || !looks_like_value(segment) {
        Cow::Borrowed(segment)
    } else {
        Cow::Borrowed(ID_MARKER)
    }
}

/// Normalize `path` and replace value-like segments with [`ID_MARKER`].
///
/// `is_literal` answers whether a segment occurs as a literal route component in the catalog;
/// such segments are never parameterized.
pub fn parameterize(path: &str, is_literal: impl Fn(&str) -> bool) -> String {
    let normalized = normalize(path);
    if normalized == "/" {
        return normalized;
    }
    let mut out = String::with_capacity(normalized.len());
    for segment in segments(&normalized) {
        out.push('/');
        out.push_str(&classify_segment(segment, &is_literal));
    }
    out
}

/// Replace every `{anything}` placeholder with [`GENERIC_MARKER`].
#[must_use]
pub fn genericize(path: &str) -> String {
    PLACEHOLDER.replace_all(path, GENERIC_MARKER).into_owned()
}
