//! Fuzz target for the table parser.
//!
//! This fuzzer tests that the CSV/TSV parser:
//! 1. Never panics on malformed input
//! 2. Produces rectangular tables that write back out

#![no_main]

use libfuzzer_sys::fuzz_target;
use curator::input::Parser;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(table) = Parser::new().parse_str(text) {
        assert!(table.rows.iter().all(|row| row.len() == table.column_count()));
        let mut out = Vec::new();
        let _ = table.write_to(&mut out);
    }
});
