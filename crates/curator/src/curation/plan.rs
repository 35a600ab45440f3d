//! The frozen set of decisions handed to the apply phase.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::apply::{CellChange, EntityUpdate, rewrite_cell};
use crate::error::{CuratorError, Result};
use crate::input::SourceMetadata;

use super::decision::{Decision, DecisionStatus};
use super::session::ReviewSummary;

/// Original cell values: entity key -> column -> value.
pub type CellSnapshot = IndexMap<String, IndexMap<String, String>>;

/// One discrepancy and the decision taken on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub discrepancy_id: String,
    pub column: String,
    pub property: String,
    /// The flagged raw value.
    pub value: String,
    /// List delimiter, for array-valued columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    /// Entities whose cells carry the value.
    pub entities: Vec<String>,
    /// Whether the replacement is a vocabulary value.
    pub in_vocabulary: bool,
    pub decision: Decision,
}

/// A value proposed for addition to the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewTerm {
    pub property: String,
    pub column: String,
    pub value: String,
}

/// The decisions of an approved review, ready to apply.
///
/// Carries the original values of every cell it touches, so it can be
/// applied without the session that produced it. A plan is read-only once
/// built; [`restricted_to`](Self::restricted_to) derives a narrower copy.
///
/// ```compile_fail
/// # fn tamper(mut plan: curator::CorrectionPlan) {
/// plan.entries.clear();
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionPlan {
    version: String,
    approved_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<SourceMetadata>,
    entries: Vec<PlanEntry>,
    cells: CellSnapshot,
}

impl CorrectionPlan {
    pub(crate) fn new(
        version: String,
        approved_at: DateTime<Utc>,
        source: Option<SourceMetadata>,
        entries: Vec<PlanEntry>,
        cells: CellSnapshot,
    ) -> Self {
        Self {
            version,
            approved_at,
            source,
            entries,
            cells,
        }
    }

    /// Session format version the plan was produced with.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// When the review was approved.
    pub fn approved_at(&self) -> DateTime<Utc> {
        self.approved_at
    }

    /// The reviewed table, if known.
    pub fn source(&self) -> Option<&SourceMetadata> {
        self.source.as_ref()
    }

    /// One entry per discrepancy, in review order.
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Original values of the cells the plan touches.
    pub fn cells(&self) -> &CellSnapshot {
        &self.cells
    }

    /// Number of decisions still pending. Zero for any plan produced by
    /// approval; a plan edited on disk may say otherwise.
    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.decision.status == DecisionStatus::Pending)
            .count()
    }

    /// Whether the plan can be applied.
    pub fn is_frozen(&self) -> bool {
        self.pending_count() == 0
    }

    /// Fail with [`CuratorError::PlanNotFrozen`] if any decision is pending.
    pub fn ensure_frozen(&self) -> Result<()> {
        match self.pending_count() {
            0 => Ok(()),
            pending => Err(CuratorError::PlanNotFrozen { pending }),
        }
    }

    /// Counts of decisions per status.
    pub fn summary(&self) -> ReviewSummary {
        ReviewSummary::from_statuses(self.entries.iter().map(|e| e.decision.status))
    }

    /// One update per entity touched by an accepted or overridden
    /// decision, ordered by first appearance in the plan.
    ///
    /// Several decisions touching the same cell (for example two list
    /// elements) are folded into a single change.
    pub fn entity_updates(&self) -> Vec<EntityUpdate> {
        let mut pending: IndexMap<&str, IndexMap<&str, (String, String)>> = IndexMap::new();

        for entry in &self.entries {
            let Some(to) = entry.decision.replacement() else {
                continue;
            };

            for entity in &entry.entities {
                let original = self
                    .cells
                    .get(entity)
                    .and_then(|cells| cells.get(&entry.column))
                    .cloned()
                    .unwrap_or_else(|| entry.value.clone());

                let (_, current) = pending
                    .entry(entity.as_str())
                    .or_default()
                    .entry(entry.column.as_str())
                    .or_insert_with(|| (original.clone(), original));

                *current = rewrite_cell(current, &entry.value, to, entry.delimiter.as_deref());
            }
        }

        pending
            .into_iter()
            .map(|(entity, columns)| EntityUpdate {
                entity: entity.to_string(),
                changes: columns
                    .into_iter()
                    .map(|(column, (from, to))| CellChange {
                        column: column.to_string(),
                        from,
                        to,
                    })
                    .collect(),
            })
            .collect()
    }

    /// Keys of the entities the plan changes, in plan order.
    pub fn touched_entities(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|e| e.decision.status.changes_data())
            .flat_map(|e| e.entities.iter())
            .filter(|entity| seen.insert(entity.as_str()))
            .cloned()
            .collect()
    }

    /// Overrides that introduce values outside the vocabulary.
    pub fn new_terms(&self) -> Vec<NewTerm> {
        let mut terms: Vec<NewTerm> = Vec::new();
        for entry in &self.entries {
            if entry.decision.status != DecisionStatus::Overridden || entry.in_vocabulary {
                continue;
            }
            let Some(value) = entry.decision.value.as_deref().filter(|v| !v.is_empty()) else {
                continue;
            };
            let term = NewTerm {
                property: entry.property.clone(),
                column: entry.column.clone(),
                value: value.to_string(),
            };
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        terms
    }

    /// A copy of the plan limited to the given entities, for re-running
    /// apply on a failed subset.
    pub fn restricted_to<S: AsRef<str>>(&self, entities: &[S]) -> CorrectionPlan {
        let keep: HashSet<&str> = entities.iter().map(|e| e.as_ref()).collect();

        let entries = self
            .entries
            .iter()
            .filter_map(|entry| {
                let entities: Vec<String> = entry
                    .entities
                    .iter()
                    .filter(|e| keep.contains(e.as_str()))
                    .cloned()
                    .collect();
                (!entities.is_empty()).then(|| PlanEntry {
                    entities,
                    ..entry.clone()
                })
            })
            .collect();

        let cells = self
            .cells
            .iter()
            .filter(|(entity, _)| keep.contains(entity.as_str()))
            .map(|(entity, columns)| (entity.clone(), columns.clone()))
            .collect();

        CorrectionPlan::new(self.version.clone(), self.approved_at, self.source.clone(), entries, cells)
    }
}
