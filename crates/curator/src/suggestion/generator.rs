//! Similarity-ranked suggestion generation.
//!
//! Every discrepancy is scored against the full vocabulary of its
//! property. Scoring is stateless, so discrepancies are scored in
//! parallel; results are written back in input order and never depend on
//! scheduling.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::schema::{PropertyCatalog, PropertyDefinition, normalize};
use crate::validation::{Discrepancy, DiscrepancyKind};

use super::similarity::{lexical_similarity, token_overlap};
use super::{Suggestion, SuggestionOrigin};

const TRUTHY: &[&str] = &["yes", "true", "1", "y", "t"];
const FALSY: &[&str] = &["no", "false", "0", "n", "f"];

/// Scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Weight of the edit-distance similarity.
    pub lexical_weight: f64,
    /// Weight of the token overlap.
    pub token_weight: f64,
    /// Confidence floor, inclusive: a candidate scoring exactly the floor
    /// is kept, anything below is dropped.
    pub min_confidence: f64,
    /// Maximum candidates kept per discrepancy.
    pub max_suggestions: usize,
    /// Score discrepancies on the rayon pool.
    pub parallel: bool,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            lexical_weight: 0.6,
            token_weight: 0.4,
            min_confidence: 0.3,
            max_suggestions: 5,
            parallel: true,
        }
    }
}

impl SuggestionConfig {
    /// Set the confidence floor.
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Set the number of candidates kept.
    pub fn with_max_suggestions(mut self, max_suggestions: usize) -> Self {
        self.max_suggestions = max_suggestions;
        self
    }

    /// Set the score weights.
    pub fn with_weights(mut self, lexical: f64, token: f64) -> Self {
        self.lexical_weight = lexical;
        self.token_weight = token;
        self
    }

    /// Enable or disable parallel scoring.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// A producer of candidate corrections.
///
/// The built-in [`SuggestionGenerator`] is one; additional sources (for
/// example one backed by a language model) can be attached to it and
/// their candidates are merged into the ranking.
pub trait SuggestionSource: Send + Sync {
    /// Name recorded in suggestion origins.
    fn name(&self) -> &str;

    /// Candidates for one discrepancy.
    fn suggest(&self, discrepancy: &Discrepancy, property: &PropertyDefinition) -> Vec<Suggestion>;
}

/// Ranks candidate corrections for discrepancies.
pub struct SuggestionGenerator {
    config: SuggestionConfig,
    sources: Vec<Box<dyn SuggestionSource>>,
}

impl SuggestionGenerator {
    /// Create a generator with default configuration.
    pub fn new() -> Self {
        Self::with_config(SuggestionConfig::default())
    }

    /// Create a generator with custom configuration.
    pub fn with_config(config: SuggestionConfig) -> Self {
        Self {
            config,
            sources: Vec::new(),
        }
    }

    /// Attach an additional suggestion source.
    pub fn with_source(mut self, source: Box<dyn SuggestionSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    /// Fill in the suggestions of every discrepancy.
    ///
    /// Discrepancies whose property is missing from the catalog get an
    /// empty list.
    pub fn annotate(&self, discrepancies: &mut [Discrepancy], catalog: &PropertyCatalog) {
        let score = |d: &mut Discrepancy| {
            d.suggestions = match catalog.get(&d.property) {
                Some(property) => self.suggest_for(d, property),
                None => Vec::new(),
            };
        };

        if self.config.parallel {
            discrepancies.par_iter_mut().for_each(score);
        } else {
            discrepancies.iter_mut().for_each(score);
        }

        let without = discrepancies.iter().filter(|d| d.suggestions.is_empty()).count();
        info!(
            discrepancies = discrepancies.len(),
            without_suggestions = without,
            "Generated suggestions"
        );
    }

    /// Ranked candidates for one discrepancy, including attached sources.
    pub fn suggest_for(&self, discrepancy: &Discrepancy, property: &PropertyDefinition) -> Vec<Suggestion> {
        let mut candidates = Vec::new();

        if let DiscrepancyKind::AmbiguousSynonym { candidates: targets } = &discrepancy.kind {
            for target in targets {
                candidates.push(
                    Suggestion::new(target.clone(), 1.0, SuggestionOrigin::Synonym)
                        .with_scores(1.0, 1.0, 0)
                        .with_rationale(format!(
                            "'{}' is a declared synonym of '{}'",
                            discrepancy.value, target
                        )),
                );
            }
        }

        candidates.extend(self.score(&discrepancy.value, property));

        for source in &self.sources {
            for mut suggestion in source.suggest(discrepancy, property) {
                if suggestion.origin == SuggestionOrigin::Similarity {
                    suggestion.origin = SuggestionOrigin::External(source.name().to_string());
                }
                candidates.push(suggestion);
            }
        }

        let ranked = self.rank(candidates);
        debug!(
            id = %discrepancy.id,
            value = %discrepancy.value,
            top = ranked.first().map(|s| s.value.as_str()).unwrap_or(""),
            candidates = ranked.len(),
            "Scored discrepancy"
        );
        ranked
    }

    /// Ranked vocabulary candidates for a raw value.
    pub fn suggest(&self, value: &str, property: &PropertyDefinition) -> Vec<Suggestion> {
        self.rank(self.score(value, property))
    }

    fn score(&self, value: &str, property: &PropertyDefinition) -> Vec<Suggestion> {
        let mut scored = Vec::with_capacity(property.value_count() + 1);

        if let Some(term) = boolean_term(value, property) {
            scored.push(
                Suggestion::new(term, 1.0, SuggestionOrigin::Boolean)
                    .with_scores(1.0, 1.0, 0)
                    .with_rationale(format!("'{}' is a boolean-like value", value.trim())),
            );
        }

        for candidate in property.valid_values() {
            let (lexical, distance) = lexical_similarity(value, candidate);
            let token = token_overlap(value, candidate);
            let confidence = self.config.lexical_weight * lexical + self.config.token_weight * token;

            scored.push(
                Suggestion::new(candidate, confidence, SuggestionOrigin::Similarity)
                    .with_scores(lexical, token, distance)
                    .with_rationale(rationale(lexical, token, distance)),
            );
        }

        scored
    }

    /// Drop weak candidates, keep the best per value, sort, and truncate.
    fn rank(&self, candidates: Vec<Suggestion>) -> Vec<Suggestion> {
        let mut kept: Vec<Suggestion> = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            if candidate.confidence < self.config.min_confidence {
                continue;
            }
            match kept.iter_mut().find(|k| k.value == candidate.value) {
                Some(existing) => {
                    if candidate.rank(existing).is_lt() {
                        *existing = candidate;
                    }
                }
                None => kept.push(candidate),
            }
        }

        kept.sort_by(Suggestion::rank);
        kept.truncate(self.config.max_suggestions);
        kept
    }
}

impl Default for SuggestionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SuggestionSource for SuggestionGenerator {
    fn name(&self) -> &str {
        "similarity"
    }

    fn suggest(&self, discrepancy: &Discrepancy, property: &PropertyDefinition) -> Vec<Suggestion> {
        self.suggest_for(discrepancy, property)
    }
}

/// The vocabulary's boolean term matching a boolean-like value.
fn boolean_term<'p>(value: &str, property: &'p PropertyDefinition) -> Option<&'p str> {
    let key = normalize(value);
    let class = if TRUTHY.contains(&key.as_str()) {
        TRUTHY
    } else if FALSY.contains(&key.as_str()) {
        FALSY
    } else {
        return None;
    };

    // Prefer the term listed first in the class ("yes" before "true")
    class.iter().find_map(|word| {
        property
            .valid_values()
            .find(|candidate| normalize(candidate) == *word && *candidate != value)
    })
}

fn rationale(lexical: f64, token: f64, distance: usize) -> String {
    if distance == 0 {
        "Differs only in case or spacing".to_string()
    } else if token > 0.0 {
        format!(
            "Edit distance {} ({:.0}% similar), {:.0}% word overlap",
            distance,
            lexical * 100.0,
            token * 100.0
        )
    } else {
        format!("Edit distance {} ({:.0}% similar)", distance, lexical * 100.0)
    }
}
