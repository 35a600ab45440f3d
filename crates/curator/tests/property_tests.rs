//! Property-based tests for detection, suggestions and apply.
//!
//! These tests use proptest to generate random tables and review
//! decisions and verify that the engine's invariants hold for all of them.
//!
//! # Running Property Tests
//!
//! ```bash
//! # Run all property tests
//! cargo test -p curator --test property_tests
//!
//! # Run with more cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p curator --test property_tests
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;

use curator::apply::rewrite_cell;
use curator::schema::{PropertyCatalog, PropertyDefinition};
use curator::{
    BatchApplier, DataTable, DecisionStatus, Detection, DiscrepancyDetector, ReviewSession,
    SuggestionConfig, SuggestionGenerator, TableStore,
};

// =============================================================================
// Test Strategies
// =============================================================================

const VOCAB: &[&str] = &["Alpha", "Beta", "Gamma Ray", "Delta"];
const SYNONYMS: &[&str] = &["A", "a"];
const NOISE: &[&str] = &["alpha", "BETA", "gamma  ray", "Delt", "Omega", "Alhpa", "bta"];

fn catalog() -> PropertyCatalog {
    PropertyCatalog::new()
        .with_property(
            PropertyDefinition::new("kind")
                .with_values(VOCAB.iter().copied())
                .with_synonym("A", "Alpha"),
        )
        .with_property(
            PropertyDefinition::new("tags")
                .with_values(VOCAB.iter().copied())
                .with_list_delimiter(";"),
        )
}

/// A value from the vocabulary or one of its synonyms.
fn valid_value() -> impl Strategy<Value = String> {
    prop::sample::select([VOCAB, SYNONYMS].concat()).prop_map(|s| s.to_string())
}

/// A value that may or may not be valid.
fn any_value() -> impl Strategy<Value = String> {
    prop::sample::select([VOCAB, NOISE].concat()).prop_map(|s| s.to_string())
}

/// A list cell of padded elements joined by ';'.
fn list_cell() -> impl Strategy<Value = String> {
    prop::collection::vec((any_value(), prop::bool::ANY), 1..4).prop_map(|elements| {
        elements
            .into_iter()
            .map(|(value, padded)| if padded { format!(" {}", value) } else { value })
            .collect::<Vec<_>>()
            .join(";")
    })
}

fn rows(kind: impl Strategy<Value = String>) -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((kind, list_cell()), 1..20)
}

fn build_table(rows: &[(String, String)]) -> DataTable {
    DataTable::new(
        vec!["id".to_string(), "kind".to_string(), "tags".to_string()],
        rows.iter()
            .enumerate()
            .map(|(i, (kind, tags))| vec![format!("E{}", i + 1), kind.clone(), tags.clone()])
            .collect(),
        b',',
    )
}

fn detect(table: &DataTable, catalog: &PropertyCatalog, parallel: bool) -> Detection {
    let mut detection = DiscrepancyDetector::new(catalog).detect_table(table, None);
    SuggestionGenerator::with_config(SuggestionConfig::default().with_parallel(parallel))
        .annotate(&mut detection.discrepancies, catalog);
    detection
}

/// Decide every discrepancy: 0 = accept, 1 = reject, 2 = skip.
fn review(table: &DataTable, choices: &[u8]) -> ReviewSession {
    let catalog = catalog();
    let detection = detect(table, &catalog, true);
    let mut session = ReviewSession::new(catalog, detection, table);

    let ids: Vec<(String, bool)> = session
        .list_discrepancies(None)
        .iter()
        .map(|d| (d.id.clone(), d.top_suggestion().is_some()))
        .collect();

    for (i, (id, has_suggestion)) in ids.iter().enumerate() {
        let choice = choices.get(i % choices.len().max(1)).copied().unwrap_or(0) % 3;
        let decided = match choice {
            0 if *has_suggestion => session.accept(id).map(|_| ()),
            2 => session.skip(id).map(|_| ()),
            _ => session.reject(id).map(|_| ()),
        };
        decided.unwrap();
    }
    session
}

fn apply(plan: &curator::CorrectionPlan, table: DataTable) -> (curator::ApplyReport, DataTable) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime.block_on(async {
        let store = Arc::new(TableStore::new(table));
        let report = BatchApplier::new(store.clone()).apply(plan).await.unwrap();
        (report, store.snapshot().await)
    })
}

// =============================================================================
// Detection Properties
// =============================================================================

proptest! {
    /// Vocabulary values and declared synonyms are never flagged.
    #[test]
    fn valid_values_never_flagged(values in prop::collection::vec(valid_value(), 1..30)) {
        let rows: Vec<(String, String)> = values
            .iter()
            .map(|v| (v.clone(), VOCAB[v.len() % VOCAB.len()].to_string()))
            .collect();
        let detection = detect(&build_table(&rows), &catalog(), false);

        prop_assert!(detection.discrepancies.is_empty());
    }

    /// Suggestions do not depend on scheduling.
    #[test]
    fn suggestions_are_deterministic(rows in rows(any_value())) {
        let table = build_table(&rows);
        let catalog = catalog();

        let sequential = detect(&table, &catalog, false);
        let parallel = detect(&table, &catalog, true);

        prop_assert_eq!(sequential.discrepancies.len(), parallel.discrepancies.len());
        for (a, b) in sequential.discrepancies.iter().zip(&parallel.discrepancies) {
            prop_assert_eq!(&a.id, &b.id);
            prop_assert_eq!(&a.value, &b.value);
            let scores_a: Vec<(&str, f64)> =
                a.suggestions.iter().map(|s| (s.value.as_str(), s.confidence)).collect();
            let scores_b: Vec<(&str, f64)> =
                b.suggestions.iter().map(|s| (s.value.as_str(), s.confidence)).collect();
            prop_assert_eq!(scores_a, scores_b);
        }
    }

    /// Accepting every suggestion and checking again finds nothing left
    /// to fix in the corrected cells.
    #[test]
    fn correction_is_idempotent(rows in rows(any_value())) {
        let table = build_table(&rows);
        let mut session = review(&table, &[0]);
        session.reject_pending(None).unwrap();
        let plan = session.approve().unwrap();

        let (_, corrected) = apply(&plan, table);
        let again = detect(&corrected, &catalog(), true);

        let unresolved: Vec<&str> = plan
            .entries()
            .iter()
            .filter(|e| e.decision.status == DecisionStatus::Rejected)
            .map(|e| e.value.as_str())
            .collect();
        for discrepancy in &again.discrepancies {
            prop_assert!(unresolved.contains(&discrepancy.value.as_str()));
        }
    }
}

// =============================================================================
// Apply Properties
// =============================================================================

proptest! {
    /// Untouched list elements keep their text, order and delimiter.
    #[test]
    fn list_rewrite_preserves_other_elements(cell in list_cell()) {
        let rewritten = rewrite_cell(&cell, "bta", "Beta", Some(";"));

        let before: Vec<&str> = cell.split(';').collect();
        let after: Vec<&str> = rewritten.split(';').collect();
        prop_assert_eq!(before.len(), after.len());

        for (old, new) in before.iter().zip(&after) {
            if old.trim() == "bta" {
                prop_assert_eq!(new.to_string(), old.replace("bta", "Beta"));
            } else {
                prop_assert_eq!(old, new);
            }
        }
    }

    /// One result per entity touched by an accepted decision.
    #[test]
    fn result_count_matches_touched_entities(
        rows in rows(any_value()),
        choices in prop::collection::vec(0u8..3, 1..8),
    ) {
        let table = build_table(&rows);
        let plan = review(&table, &choices).approve().unwrap();

        let (report, _) = apply(&plan, table);

        prop_assert_eq!(report.len(), plan.touched_entities().len());
        prop_assert_eq!(report.len(), plan.entity_updates().len());
        prop_assert!(report.all_succeeded());
    }

    /// Rejected and skipped values are still in place after apply.
    #[test]
    fn rejected_and_skipped_values_unchanged(
        rows in rows(any_value()),
        choices in prop::collection::vec(0u8..3, 1..8),
    ) {
        let table = build_table(&rows);
        let plan = review(&table, &choices).approve().unwrap();

        let changed: HashMap<(&str, &str), bool> = plan
            .entries()
            .iter()
            .map(|e| ((e.column.as_str(), e.value.as_str()), e.decision.status.changes_data()))
            .collect();
        let kept = |column: &str, value: &str| {
            !changed.get(&(column, value)).copied().unwrap_or(false)
        };

        let (_, corrected) = apply(&plan, table.clone());

        for row in 0..table.row_count() {
            let kind = table.get(row, 1).unwrap();
            if kept("kind", kind) {
                prop_assert_eq!(corrected.get(row, 1), Some(kind));
            }

            let before: Vec<&str> = table.get(row, 2).unwrap().split(';').collect();
            let tags = corrected.get(row, 2).unwrap().to_string();
            let after: Vec<&str> = tags.split(';').collect();
            prop_assert_eq!(before.len(), after.len());
            for (old, new) in before.iter().zip(&after) {
                if kept("tags", old.trim()) {
                    prop_assert_eq!(old, new);
                }
            }
        }
    }
}
