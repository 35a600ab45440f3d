//! Discrepancy detection against controlled vocabularies.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::input::DataTable;
use crate::schema::{Membership, PropertyCatalog, PropertyDefinition};
use crate::suggestion::Suggestion;

use super::collector::{ObservedValue, ValueCollector};

/// Why an observed value was flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscrepancyKind {
    /// Matches a canonical value except for case or spacing.
    CaseOrSpacing { canonical: String },
    /// Folds into several canonical values through declared synonyms.
    AmbiguousSynonym { candidates: Vec<String> },
    /// Not in the vocabulary at all.
    NotInVocabulary,
}

impl DiscrepancyKind {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            DiscrepancyKind::CaseOrSpacing { .. } => "Case/Spacing",
            DiscrepancyKind::AmbiguousSynonym { .. } => "Ambiguous Synonym",
            DiscrepancyKind::NotInVocabulary => "Not In Vocabulary",
        }
    }
}

/// A distinct observed value that fails its property's vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Session-local identifier (`disc_001`, ...).
    pub id: String,
    /// Column the value was observed in.
    pub column: String,
    /// Property the column maps to.
    pub property: String,
    /// The raw value (one list element for array-valued columns).
    pub value: String,
    /// Why the value was flagged.
    pub kind: DiscrepancyKind,
    /// Number of rows carrying the value.
    pub count: usize,
    /// Whether the value is an element of delimited list cells.
    pub is_array_valued: bool,
    /// List delimiter, for array-valued columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    /// Entities carrying the value, in row order.
    pub entities: Vec<String>,
    /// Ranked candidate corrections; empty means manual input is needed.
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

impl Discrepancy {
    /// The highest ranked suggestion, if any.
    pub fn top_suggestion(&self) -> Option<&Suggestion> {
        self.suggestions.first()
    }

    /// Whether `value` is one of the suggested candidates.
    pub fn has_candidate(&self, value: &str) -> bool {
        self.suggestions.iter().any(|s| s.value == value)
    }
}

/// A column excluded from detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmappedColumn {
    pub column: String,
    pub reason: String,
}

/// Output of a detection run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detection {
    /// Flagged values, most common first within each column.
    pub discrepancies: Vec<Discrepancy>,
    /// Columns that were skipped.
    pub unmapped: Vec<UnmappedColumn>,
    /// Columns that were checked.
    pub checked_columns: Vec<String>,
}

/// Diffs observed values against a property catalog.
pub struct DiscrepancyDetector<'a> {
    catalog: &'a PropertyCatalog,
    next_id: usize,
    skipped: Vec<String>,
}

impl<'a> DiscrepancyDetector<'a> {
    /// Create a detector whose IDs start at `disc_001`.
    pub fn new(catalog: &'a PropertyCatalog) -> Self {
        Self {
            catalog,
            next_id: 1,
            skipped: Vec::new(),
        }
    }

    /// Never check these columns unless they are selected explicitly.
    pub fn with_skipped_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skipped = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Check every column of a table except the entity key column.
    ///
    /// When `columns` is given, only those columns are checked; otherwise
    /// every column but the skipped ones is.
    pub fn detect_table(&mut self, table: &DataTable, columns: Option<&[String]>) -> Detection {
        let mut detection = Detection::default();
        let key_column = table.key_column().to_string();

        for (index, column) in table.headers.iter().enumerate() {
            if *column == key_column {
                continue;
            }
            match columns {
                Some(selected) if !selected.iter().any(|c| c == column) => continue,
                None if self.skipped.iter().any(|c| c == column) => {
                    debug!(column = %column, "Skipping system column");
                    continue;
                }
                _ => {}
            }

            let property = match self.catalog.resolve(column) {
                Some(p) if p.is_constrained() => p,
                Some(_) => {
                    detection.unmapped.push(unmapped(column, "no controlled vocabulary"));
                    continue;
                }
                None => {
                    detection.unmapped.push(unmapped(column, "no matching property in schema"));
                    continue;
                }
            };

            let observed = ValueCollector::for_property(property).collect(table, index);
            detection
                .discrepancies
                .extend(self.detect_column(property, &observed));
            detection.checked_columns.push(column.clone());
        }

        info!(
            checked = detection.checked_columns.len(),
            unmapped = detection.unmapped.len(),
            discrepancies = detection.discrepancies.len(),
            "Detection complete"
        );

        detection
    }

    /// Flag the observed values of one column that fail `property`.
    pub fn detect_column(
        &mut self,
        property: &PropertyDefinition,
        observed: &[ObservedValue],
    ) -> Vec<Discrepancy> {
        let mut discrepancies = Vec::new();

        for value in observed {
            let kind = match property.classify(&value.value) {
                Membership::Valid | Membership::Synonym(_) => continue,
                Membership::CaseOrSpacing(canonical) => DiscrepancyKind::CaseOrSpacing { canonical },
                Membership::AmbiguousSynonym(candidates) => {
                    DiscrepancyKind::AmbiguousSynonym { candidates }
                }
                Membership::Invalid => DiscrepancyKind::NotInVocabulary,
            };

            let id = format!("disc_{:03}", self.next_id);
            self.next_id += 1;

            debug!(
                id = %id,
                column = %value.column,
                value = %value.value,
                count = value.count,
                kind = kind.label(),
                "Flagged value"
            );

            discrepancies.push(Discrepancy {
                id,
                column: value.column.clone(),
                property: property.name.clone(),
                value: value.value.clone(),
                kind,
                count: value.count,
                is_array_valued: value.is_array_valued,
                delimiter: property.is_array_valued.then(|| property.delimiter.clone()),
                entities: value.entities.clone(),
                suggestions: Vec::new(),
            });
        }

        discrepancies
    }
}

fn unmapped(column: &str, reason: &str) -> UnmappedColumn {
    warn!(column, reason, "Skipping column");
    UnmappedColumn {
        column: column.to_string(),
        reason: reason.to_string(),
    }
}
