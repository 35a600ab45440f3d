//! Main Curator struct and public API.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::apply::{ApplyConfig, ApplyReport, BatchApplier, TableStore};
use crate::curation::{CorrectionPlan, ReviewSession};
use crate::error::{CuratorError, Result};
use crate::input::{DataTable, Parser, ParserConfig, SourceMetadata};
use crate::schema::{DEFAULT_LIST_DELIMITER, PropertyCatalog, SchemaExtractor};
use crate::suggestion::{SuggestionConfig, SuggestionGenerator, SuggestionSource};
use crate::validation::{Detection, DiscrepancyDetector};

/// Bookkeeping columns of metadata-store exports. They never carry
/// controlled values, even when the data model happens to define a
/// property of the same name.
pub const SYSTEM_COLUMNS: &[&str] = &[
    "name",
    "type",
    "id",
    "etag",
    "createdOn",
    "modifiedOn",
    "createdBy",
    "modifiedBy",
    "parentId",
    "currentVersion",
    "benefactorId",
    "projectId",
    "concreteType",
    "versionNumber",
    "versionLabel",
    "versionComment",
    "dataFileHandleId",
    "columnId",
    "entityId",
    "ROW_ID",
    "ROW_VERSION",
    "ROW_ETAG",
];

/// Configuration for a curator run.
///
/// Every field has a default, so a config file only needs the values it
/// changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CuratorConfig {
    /// Suggestion scoring.
    pub suggestion: SuggestionConfig,
    /// Table parsing.
    pub parser: ParserConfig,
    /// Apply worker pool.
    pub apply: ApplyConfig,
    /// List delimiter for array-valued properties that declare none.
    pub default_list_delimiter: String,
    /// Restrict checking to these columns (None = all).
    pub columns: Option<Vec<String>>,
    /// Columns never checked unless listed in `columns`.
    pub skip_columns: Vec<String>,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            suggestion: SuggestionConfig::default(),
            parser: ParserConfig::default(),
            apply: ApplyConfig::default(),
            default_list_delimiter: DEFAULT_LIST_DELIMITER.to_string(),
            columns: None,
            skip_columns: SYSTEM_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl CuratorConfig {
    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CuratorError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&text)
            .map_err(|e| CuratorError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn with_suggestion(mut self, suggestion: SuggestionConfig) -> Self {
        self.suggestion = suggestion;
        self
    }

    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_apply(mut self, apply: ApplyConfig) -> Self {
        self.apply = apply;
        self
    }

    pub fn with_default_list_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.default_list_delimiter = delimiter.into();
        self
    }

    /// Only check the named columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the list of columns that are never checked.
    pub fn with_skip_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// Result of checking a table against a data model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Metadata about the checked table.
    pub source: SourceMetadata,
    /// Where the data model came from.
    pub schema_source: String,
    /// Discrepancies (with suggestions) and unmapped columns.
    pub detection: Detection,
    /// Summary statistics.
    pub summary: CheckSummary,
}

/// Summary of a check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    /// Columns checked against a vocabulary.
    pub columns_checked: usize,
    /// Columns skipped.
    pub columns_unmapped: usize,
    /// Columns with at least one discrepancy.
    pub columns_with_discrepancies: usize,
    /// Distinct flagged values.
    pub discrepancies: usize,
    /// Cells carrying a flagged value.
    pub affected_cells: usize,
    /// Discrepancies without any candidate correction.
    pub without_suggestions: usize,
}

impl CheckSummary {
    fn from_detection(detection: &Detection) -> Self {
        let columns: BTreeSet<&str> = detection
            .discrepancies
            .iter()
            .map(|d| d.column.as_str())
            .collect();

        Self {
            columns_checked: detection.checked_columns.len(),
            columns_unmapped: detection.unmapped.len(),
            columns_with_discrepancies: columns.len(),
            discrepancies: detection.discrepancies.len(),
            affected_cells: detection.discrepancies.iter().map(|d| d.count).sum(),
            without_suggestions: detection
                .discrepancies
                .iter()
                .filter(|d| d.suggestions.is_empty())
                .count(),
        }
    }

    /// True when no value needs review.
    pub fn is_clean(&self) -> bool {
        self.discrepancies == 0
    }
}

/// The main curator engine.
///
/// Ties the phases together: extract the vocabulary, collect and diff the
/// observed values, rank suggestions, then hand the result to a review
/// session or an apply run.
pub struct Curator {
    config: CuratorConfig,
    parser: Parser,
    extractor: SchemaExtractor,
    generator: SuggestionGenerator,
}

impl Curator {
    /// Create a curator with default configuration.
    pub fn new() -> Self {
        Self::with_config(CuratorConfig::default())
    }

    /// Create a curator with custom configuration.
    pub fn with_config(config: CuratorConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        let extractor =
            SchemaExtractor::new().with_default_delimiter(config.default_list_delimiter.clone());
        let generator = SuggestionGenerator::with_config(config.suggestion.clone());

        Self {
            config,
            parser,
            extractor,
            generator,
        }
    }

    /// Attach an additional suggestion source.
    pub fn with_suggestion_source(mut self, source: Box<dyn SuggestionSource>) -> Self {
        self.generator = self.generator.with_source(source);
        self
    }

    pub fn config(&self) -> &CuratorConfig {
        &self.config
    }

    /// Load a data model from a path or an http(s) URL.
    pub fn load_schema(&self, source: &str) -> Result<PropertyCatalog> {
        self.extractor.load(source)
    }

    /// Parse a tabular snapshot.
    pub fn load_table(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        self.parser.parse_file(path)
    }

    /// Detect discrepancies in a table and rank suggestions for each.
    pub fn detect(&self, table: &DataTable, catalog: &PropertyCatalog) -> Detection {
        let mut detection = DiscrepancyDetector::new(catalog)
            .with_skipped_columns(self.config.skip_columns.iter().cloned())
            .detect_table(table, self.config.columns.as_deref());
        self.generator
            .annotate(&mut detection.discrepancies, catalog);
        detection
    }

    /// Check a table file against a data model.
    pub fn check(&self, table_path: impl AsRef<Path>, schema_source: &str) -> Result<CheckResult> {
        let catalog = self.load_schema(schema_source)?;
        let (table, source) = self.load_table(table_path)?;

        let detection = self.detect(&table, &catalog);
        let summary = CheckSummary::from_detection(&detection);

        info!(
            file = %source.file,
            columns = summary.columns_checked,
            discrepancies = summary.discrepancies,
            "Check complete"
        );

        Ok(CheckResult {
            source,
            schema_source: schema_source.to_string(),
            detection,
            summary,
        })
    }

    /// Check a table file and open a review session over the result.
    pub fn review(&self, table_path: impl AsRef<Path>, schema_source: &str) -> Result<ReviewSession> {
        let catalog = self.load_schema(schema_source)?;
        let (table, source) = self.load_table(table_path)?;
        Ok(self
            .start_review(catalog, &table)
            .with_source(source)
            .with_schema_source(schema_source))
    }

    /// Open a review session over an already loaded table.
    pub fn start_review(&self, catalog: PropertyCatalog, table: &DataTable) -> ReviewSession {
        let detection = self.detect(table, &catalog);
        ReviewSession::new(catalog, detection, table)
    }

    /// Apply a frozen plan to a table snapshot.
    ///
    /// Returns the per-entity report and the corrected snapshot.
    pub async fn apply_to_table(
        &self,
        plan: &CorrectionPlan,
        table: DataTable,
        cancel: CancellationToken,
    ) -> Result<(ApplyReport, DataTable)> {
        let store = Arc::new(TableStore::new(table));
        let report = BatchApplier::new(store.clone())
            .with_config(self.config.apply.clone())
            .with_cancellation(cancel)
            .apply(plan)
            .await?;
        let table = store.snapshot().await;
        Ok((report, table))
    }
}

impl Default for Curator {
    fn default() -> Self {
        Self::new()
    }
}
