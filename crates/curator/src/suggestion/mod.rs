//! Candidate corrections for discrepancies.
//!
//! Candidates are ranked by a weighted mix of edit-distance similarity and
//! word overlap, with handlers for boolean-like values and ambiguous
//! synonyms. No candidate clearing the confidence floor is a normal
//! outcome that calls for manual input.

mod generator;
pub mod similarity;
mod suggestion;

pub use generator::{SuggestionConfig, SuggestionGenerator, SuggestionSource};
pub use suggestion::{Suggestion, SuggestionOrigin};
