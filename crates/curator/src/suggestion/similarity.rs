//! String similarity measures used to rank candidate values.
//!
//! All measures operate on normalized text (see
//! [`normalize`](crate::schema::normalize)), so case and spacing
//! differences never cost anything.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::normalize;

// Word boundaries: whitespace, punctuation, and symbols.
static TOKEN_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\p{P}\p{S}]+").unwrap());

/// Levenshtein distance over Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0usize; b_chars.len() + 1];

    for (i, &ca) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// Edit-distance similarity `1 - distance / max(len)` of the normalized
/// strings, with the distance itself.
pub fn lexical_similarity(a: &str, b: &str) -> (f64, usize) {
    let a = normalize(a);
    let b = normalize(b);
    let distance = levenshtein(&a, &b);
    let longest = a.chars().count().max(b.chars().count());

    if longest == 0 {
        return (1.0, 0);
    }
    (1.0 - distance as f64 / longest as f64, distance)
}

/// Lowercased word tokens.
pub fn tokenize(value: &str) -> BTreeSet<String> {
    TOKEN_SEPARATOR
        .split(&value.to_lowercase())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of the word token sets. Zero when either side has
/// no tokens.
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let a = tokenize(a);
    let b = tokenize(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    intersection as f64 / union as f64
}
