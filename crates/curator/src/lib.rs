//! Curator: controlled-vocabulary validation and correction for tabular metadata.
//!
//! Curator checks each column of a metadata table against the vocabulary a
//! JSON-LD data model declares for it, ranks candidate corrections for every
//! value outside that vocabulary, and applies the corrections a reviewer
//! approved.
//!
//! # Core Principles
//!
//! - **Review before write**: nothing is changed until a plan is approved
//! - **Non-destructive**: rejected and skipped values are left untouched
//! - **Isolated failures**: one entity failing to update never stops the others
//!
//! # Example
//!
//! ```no_run
//! use curator::Curator;
//!
//! let curator = Curator::new();
//! let result = curator.check("metadata.tsv", "model.jsonld").unwrap();
//!
//! println!("Columns checked: {}", result.summary.columns_checked);
//! println!("Discrepancies: {}", result.summary.discrepancies);
//! ```

pub mod apply;
pub mod curation;
pub mod error;
pub mod input;
pub mod schema;
pub mod suggestion;
pub mod validation;

mod curator;

pub use crate::curator::{CheckResult, CheckSummary, Curator, CuratorConfig, SYSTEM_COLUMNS};
pub use apply::{ApplyConfig, ApplyError, ApplyReport, ApplyResult, BatchApplier, EntityStore, TableStore};
pub use curation::{CorrectionPlan, Decision, DecisionStatus, ReviewAction, ReviewSession};
pub use error::{CuratorError, Result};
pub use input::{DataTable, SourceMetadata};
pub use schema::{PropertyCatalog, PropertyDefinition, SchemaExtractor};
pub use suggestion::{Suggestion, SuggestionConfig, SuggestionGenerator, SuggestionSource};
pub use validation::{Detection, Discrepancy, DiscrepancyDetector, DiscrepancyKind, ValueCollector};
