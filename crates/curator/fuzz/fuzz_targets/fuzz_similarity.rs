//! Fuzz target for similarity scoring.
//!
//! This fuzzer tests that scoring:
//! 1. Never panics on arbitrary Unicode
//! 2. Keeps every score within [0, 1]
//! 3. Is symmetric

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use curator::schema::PropertyDefinition;
use curator::suggestion::similarity::{lexical_similarity, token_overlap};
use curator::SuggestionGenerator;

#[derive(Debug, Arbitrary)]
struct Input {
    value: String,
    vocabulary: Vec<String>,
}

fuzz_target!(|input: Input| {
    if input.value.len() > 1_000 || input.vocabulary.len() > 64 {
        return;
    }

    for term in &input.vocabulary {
        let (lexical, distance) = lexical_similarity(&input.value, term);
        assert!((0.0..=1.0).contains(&lexical));
        assert_eq!(lexical_similarity(term, &input.value).1, distance);

        let overlap = token_overlap(&input.value, term);
        assert!((0.0..=1.0).contains(&overlap));
    }

    let property = PropertyDefinition::new("fuzz").with_values(input.vocabulary.iter().cloned());
    let suggestions = SuggestionGenerator::new().suggest(&input.value, &property);
    assert!(suggestions.len() <= 5);
    for suggestion in &suggestions {
        assert!(suggestion.confidence >= 0.3 && suggestion.confidence <= 1.0 + 1e-9);
    }
});
