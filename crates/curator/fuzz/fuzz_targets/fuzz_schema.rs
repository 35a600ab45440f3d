//! Fuzz target for data model extraction.
//!
//! This fuzzer tests that the JSON-LD extractor:
//! 1. Never panics on malformed documents
//! 2. Only yields properties whose values survive membership checks

#![no_main]

use libfuzzer_sys::fuzz_target;
use curator::schema::{Membership, SchemaExtractor};

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(catalog) = SchemaExtractor::new().extract_str(text) {
        for property in catalog.properties() {
            for value in property.valid_values() {
                assert_eq!(property.classify(value), Membership::Valid);
            }
        }
    }
});
