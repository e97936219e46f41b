//! Label normalization
//!
//! Classifier class names arrive with arbitrary casing and spacing
//! ("Kinky Hair", " red "). Everything downstream compares normalized keys.

/// Canonicalize a raw classifier label into a registry lookup key.
///
/// Trims, lowercases and drops every whitespace character. Empty input
/// yields an empty key, which no registry ever contains.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalize an optional label, treating `None` as empty.
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}
