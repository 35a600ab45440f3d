//! Ranked candidate corrections.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// What produced a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionOrigin {
    /// Lexical and token similarity scoring.
    Similarity,
    /// Boolean-like value mapped to the vocabulary's boolean term.
    Boolean,
    /// One of several canonical values an ambiguous synonym folds into.
    Synonym,
    /// A pluggable source such as a language model.
    External(String),
}

impl SuggestionOrigin {
    /// Get a human-readable label.
    pub fn label(&self) -> &str {
        match self {
            SuggestionOrigin::Similarity => "similarity",
            SuggestionOrigin::Boolean => "boolean",
            SuggestionOrigin::Synonym => "synonym",
            SuggestionOrigin::External(name) => name,
        }
    }
}

/// A candidate replacement value for a discrepancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// The canonical value proposed.
    pub value: String,

    /// Combined confidence (0.0-1.0).
    pub confidence: f64,

    /// Normalized edit-distance similarity.
    pub lexical: f64,

    /// Jaccard similarity of word tokens.
    pub token_overlap: f64,

    /// Raw edit distance between the normalized strings.
    pub distance: usize,

    /// Human-readable rationale.
    pub rationale: String,

    /// What produced this suggestion.
    pub origin: SuggestionOrigin,
}

impl Suggestion {
    /// Create a suggestion with the given confidence and no score breakdown.
    pub fn new(value: impl Into<String>, confidence: f64, origin: SuggestionOrigin) -> Self {
        Self {
            value: value.into(),
            confidence,
            lexical: 0.0,
            token_overlap: 0.0,
            distance: 0,
            rationale: String::new(),
            origin,
        }
    }

    /// Set the score breakdown.
    pub fn with_scores(mut self, lexical: f64, token_overlap: f64, distance: usize) -> Self {
        self.lexical = lexical;
        self.token_overlap = token_overlap;
        self.distance = distance;
        self
    }

    /// Set the rationale.
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    /// Ranking order: confidence desc, token overlap desc, distance asc,
    /// then value.
    pub fn rank(&self, other: &Self) -> Ordering {
        other
            .confidence
            .total_cmp(&self.confidence)
            .then_with(|| other.token_overlap.total_cmp(&self.token_overlap))
            .then_with(|| self.distance.cmp(&other.distance))
            .then_with(|| self.value.cmp(&other.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(value: &str, confidence: f64, token: f64, distance: usize) -> Suggestion {
        Suggestion::new(value, confidence, SuggestionOrigin::Similarity).with_scores(0.0, token, distance)
    }

    #[test]
    fn test_rank_by_confidence() {
        let mut list = vec![scored("a", 0.4, 0.0, 1), scored("b", 0.9, 0.0, 1)];
        list.sort_by(Suggestion::rank);
        assert_eq!(list[0].value, "b");
    }

    #[test]
    fn test_rank_tie_breaks() {
        let mut list = vec![
            scored("zeta", 0.5, 0.0, 2),
            scored("beta", 0.5, 0.0, 3),
            scored("alpha", 0.5, 0.0, 2),
            scored("gamma", 0.5, 0.5, 9),
        ];
        list.sort_by(Suggestion::rank);
        let order: Vec<&str> = list.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(order, vec!["gamma", "alpha", "zeta", "beta"]);
    }

    #[test]
    fn test_origin_label() {
        assert_eq!(SuggestionOrigin::External("llm".into()).label(), "llm");
        assert_eq!(SuggestionOrigin::Boolean.label(), "boolean");
    }
}
