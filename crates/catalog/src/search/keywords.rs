//! Query tokenizing and `ILIKE` pattern helpers for the substring tiers.

/// Words that carry no search signal in requests like "show me all open tickets".
pub const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "with", "by", "about",
    "like", "from", "of", "as", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "do", "does", "did", "will", "would", "should", "could", "can", "i", "you", "he", "she",
    "it", "we", "they", "this", "that", "these", "those", "get", "find", "show", "list", "give",
    "me", "all", "some", "any", "how", "what", "when", "where", "why",
];

/// Tokens shorter than this are dropped.
pub const MIN_KEYWORD_LEN: usize = 3;

/// Lower-case, split on whitespace, drop stopwords and short tokens. Order is preserved.
#[must_use]
pub fn keywords(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_KEYWORD_LEN && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// `%term%` with `ILIKE` wildcards in `term` escaped so user text matches literally.
#[must_use]
pub fn contains_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}
