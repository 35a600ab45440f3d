//! Text normalization shared by schema loading and membership tests.

/// Normalize a value for case- and whitespace-insensitive comparison.
///
/// Trims the value, collapses internal whitespace runs to a single space,
/// and lowercases.
///
/// ```
/// use curator::schema::normalize;
///
/// assert_eq!(normalize("  Whole   Genome Sequencing "), "whole genome sequencing");
/// ```
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Local part of a compact IRI (`bts:Male` -> `Male`).
pub fn local_name(id: &str) -> &str {
    id.rsplit([':', '/', '#']).next().unwrap_or(id)
}
