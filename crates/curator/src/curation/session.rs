//! The review state machine.
//!
//! A [`ReviewSession`] owns the vocabulary, the discrepancies, and one
//! decision per discrepancy for a single run. Every discrepancy starts
//! `Pending`; the reviewer moves it to a terminal state and may reopen it
//! any number of times until [`ReviewSession::approve`] freezes the
//! decisions into a [`CorrectionPlan`]. After approval the session
//! refuses every change.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CuratorError, Result};
use crate::input::{DataTable, SourceMetadata};
use crate::schema::PropertyCatalog;
use crate::validation::{Detection, Discrepancy, DiscrepancyKind, UnmappedColumn};

use super::decision::{Decision, DecisionStatus, ReviewAction};
use super::plan::{CellSnapshot, CorrectionPlan, PlanEntry};

/// Current version of the session and plan file format.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Counts of discrepancies by decision status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub pending: usize,
    pub accepted: usize,
    pub overridden: usize,
    pub rejected: usize,
    pub skipped: usize,
}

impl ReviewSummary {
    /// Tally a sequence of statuses.
    pub fn from_statuses(statuses: impl IntoIterator<Item = DecisionStatus>) -> Self {
        let mut summary = Self::default();
        for status in statuses {
            match status {
                DecisionStatus::Pending => summary.pending += 1,
                DecisionStatus::Accepted => summary.accepted += 1,
                DecisionStatus::Overridden => summary.overridden += 1,
                DecisionStatus::Rejected => summary.rejected += 1,
                DecisionStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    /// Total number of discrepancies.
    pub fn total(&self) -> usize {
        self.pending + self.decided()
    }

    /// Number of decided discrepancies.
    pub fn decided(&self) -> usize {
        self.accepted + self.overridden + self.rejected + self.skipped
    }

    /// Number of decisions that change data.
    pub fn changes(&self) -> usize {
        self.accepted + self.overridden
    }
}

/// One review run over a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSession {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// The snapshot the discrepancies were detected in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetadata>,

    /// Where the schema was loaded from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_source: Option<String>,

    catalog: PropertyCatalog,
    discrepancies: Vec<Discrepancy>,
    decisions: IndexMap<String, Decision>,
    #[serde(default)]
    unmapped: Vec<UnmappedColumn>,
    cells: CellSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    approved_at: Option<DateTime<Utc>>,
}

impl ReviewSession {
    /// Start a session over detected (and annotated) discrepancies.
    ///
    /// The original values of every flagged cell are captured from `table`
    /// so the eventual plan is self-contained.
    pub fn new(catalog: PropertyCatalog, detection: Detection, table: &DataTable) -> Self {
        let now = Utc::now();
        let Detection {
            discrepancies,
            unmapped,
            ..
        } = detection;

        let mut cells = CellSnapshot::new();
        for discrepancy in &discrepancies {
            let Some(col) = table.column_index(&discrepancy.column) else {
                continue;
            };
            for entity in &discrepancy.entities {
                let Some(value) = table.row_for_key(entity).and_then(|row| table.get(row, col)) else {
                    continue;
                };
                cells
                    .entry(entity.clone())
                    .or_default()
                    .insert(discrepancy.column.clone(), value.to_string());
            }
        }

        let decisions = discrepancies
            .iter()
            .map(|d| (d.id.clone(), Decision::pending(d.id.clone())))
            .collect();

        info!(discrepancies = discrepancies.len(), "Started review session");

        Self {
            version: FORMAT_VERSION.to_string(),
            created_at: now,
            updated_at: now,
            source: None,
            schema_source: None,
            catalog,
            discrepancies,
            decisions,
            unmapped,
            cells,
            approved_at: None,
        }
    }

    /// Record the snapshot metadata.
    pub fn with_source(mut self, source: SourceMetadata) -> Self {
        self.source = Some(source);
        self
    }

    /// Record where the schema came from.
    pub fn with_schema_source(mut self, schema_source: impl Into<String>) -> Self {
        self.schema_source = Some(schema_source.into());
        self
    }

    /// The vocabulary in use.
    pub fn catalog(&self) -> &PropertyCatalog {
        &self.catalog
    }

    /// Columns excluded from detection.
    pub fn unmapped(&self) -> &[UnmappedColumn] {
        &self.unmapped
    }

    /// All discrepancies, or those of one column, in review order.
    pub fn list_discrepancies(&self, column: Option<&str>) -> Vec<&Discrepancy> {
        self.discrepancies
            .iter()
            .filter(|d| column.is_none_or(|c| d.column == c))
            .collect()
    }

    /// Look up a discrepancy.
    pub fn discrepancy(&self, id: &str) -> Result<&Discrepancy> {
        self.discrepancies
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| CuratorError::DiscrepancyNotFound(id.to_string()))
    }

    /// The current decision on a discrepancy.
    pub fn decision(&self, id: &str) -> Option<&Decision> {
        self.decisions.get(id)
    }

    /// Status of a discrepancy.
    pub fn status(&self, id: &str) -> DecisionStatus {
        self.decisions
            .get(id)
            .map(|d| d.status)
            .unwrap_or(DecisionStatus::Pending)
    }

    /// Discrepancies still awaiting a decision.
    pub fn pending(&self) -> Vec<&Discrepancy> {
        self.discrepancies
            .iter()
            .filter(|d| self.status(&d.id) == DecisionStatus::Pending)
            .collect()
    }

    /// The first discrepancy awaiting a decision.
    pub fn next_pending(&self) -> Option<&Discrepancy> {
        self.discrepancies
            .iter()
            .find(|d| self.status(&d.id) == DecisionStatus::Pending)
    }

    /// Record a decision.
    ///
    /// `Accept` without a value takes the top suggestion; with a value it
    /// must name one of the suggestions. `Override` requires a value; an
    /// empty one clears the cell (or drops the list element).
    pub fn decide(&mut self, id: &str, action: ReviewAction, value: Option<&str>) -> Result<&Decision> {
        self.ensure_open()?;
        let discrepancy = self.discrepancy(id)?;

        let decision = match action {
            ReviewAction::Accept => {
                let candidate = match value {
                    Some(v) if discrepancy.has_candidate(v) => v.to_string(),
                    Some(v) => {
                        return Err(CuratorError::InvalidDecision(format!(
                            "'{}' is not a suggested candidate for {}",
                            v, id
                        )));
                    }
                    None => discrepancy
                        .top_suggestion()
                        .map(|s| s.value.clone())
                        .ok_or_else(|| {
                            CuratorError::InvalidDecision(format!(
                                "{} has no suggestions; override it with a value instead",
                                id
                            ))
                        })?,
                };
                Decision::accepted(id, candidate)
            }
            ReviewAction::Override => {
                let v = value.ok_or_else(|| {
                    CuratorError::InvalidDecision(format!("override of {} requires a value", id))
                })?;
                Decision::overridden(id, v.trim())
            }
            ReviewAction::Reject => Decision::rejected(id),
            ReviewAction::Skip => Decision::skipped(id),
        };

        debug!(
            id,
            action = %action,
            value = decision.value.as_deref().unwrap_or(""),
            "Recorded decision"
        );

        self.set_decision(decision)
    }

    /// Accept the top suggestion.
    pub fn accept(&mut self, id: &str) -> Result<&Decision> {
        self.decide(id, ReviewAction::Accept, None)
    }

    /// Replace with a user-supplied value.
    pub fn override_value(&mut self, id: &str, value: &str) -> Result<&Decision> {
        self.decide(id, ReviewAction::Override, Some(value))
    }

    /// Keep the value as is.
    pub fn reject(&mut self, id: &str) -> Result<&Decision> {
        self.decide(id, ReviewAction::Reject, None)
    }

    /// Defer the discrepancy; the value is kept.
    pub fn skip(&mut self, id: &str) -> Result<&Decision> {
        self.decide(id, ReviewAction::Skip, None)
    }

    /// Return a decided discrepancy to `Pending`.
    pub fn reopen(&mut self, id: &str) -> Result<&Decision> {
        self.ensure_open()?;
        self.discrepancy(id)?;
        debug!(id, "Reopened discrepancy");
        self.set_decision(Decision::pending(id))
    }

    /// Accept the top suggestion of every pending discrepancy whose
    /// confidence reaches `min_confidence`, optionally in one column.
    ///
    /// Ambiguous synonyms are never accepted in bulk. Returns the number
    /// of discrepancies accepted.
    pub fn accept_above(&mut self, min_confidence: f64, column: Option<&str>) -> Result<usize> {
        self.ensure_open()?;

        let targets: Vec<(String, String)> = self
            .pending()
            .into_iter()
            .filter(|d| column.is_none_or(|c| d.column == c))
            .filter(|d| !matches!(d.kind, DiscrepancyKind::AmbiguousSynonym { .. }))
            .filter_map(|d| {
                let top = d.top_suggestion()?;
                (top.confidence >= min_confidence).then(|| (d.id.clone(), top.value.clone()))
            })
            .collect();

        for (id, value) in &targets {
            self.set_decision(Decision::accepted(id, value).with_notes("batch accept"))?;
        }

        info!(accepted = targets.len(), min_confidence, "Batch accepted suggestions");
        Ok(targets.len())
    }

    /// Reject every pending discrepancy, optionally in one column.
    pub fn reject_pending(&mut self, column: Option<&str>) -> Result<usize> {
        self.ensure_open()?;

        let targets: Vec<String> = self
            .pending()
            .into_iter()
            .filter(|d| column.is_none_or(|c| d.column == c))
            .map(|d| d.id.clone())
            .collect();

        for id in &targets {
            self.set_decision(Decision::rejected(id).with_notes("batch reject"))?;
        }

        Ok(targets.len())
    }

    /// Counts per status.
    pub fn summary(&self) -> ReviewSummary {
        ReviewSummary::from_statuses(self.discrepancies.iter().map(|d| self.status(&d.id)))
    }

    /// Fraction of discrepancies decided (0.0 to 1.0).
    pub fn progress(&self) -> f64 {
        let summary = self.summary();
        if summary.total() == 0 {
            return 1.0;
        }
        summary.decided() as f64 / summary.total() as f64
    }

    /// Whether [`approve`](Self::approve) would succeed.
    pub fn can_approve(&self) -> bool {
        !self.is_approved() && self.summary().pending == 0
    }

    /// Whether the session has been approved.
    pub fn is_approved(&self) -> bool {
        self.approved_at.is_some()
    }

    /// Freeze the decisions into a correction plan.
    ///
    /// Fails with [`CuratorError::PlanNotFrozen`] while any discrepancy is
    /// pending. Irreversible: the session is closed afterwards.
    pub fn approve(&mut self) -> Result<CorrectionPlan> {
        self.ensure_open()?;

        let summary = self.summary();
        if summary.pending > 0 {
            return Err(CuratorError::PlanNotFrozen {
                pending: summary.pending,
            });
        }

        let now = Utc::now();
        self.approved_at = Some(now);
        self.updated_at = now;

        info!(
            accepted = summary.accepted,
            overridden = summary.overridden,
            rejected = summary.rejected,
            skipped = summary.skipped,
            "Approved correction plan"
        );

        self.plan()
    }

    /// The plan of an approved session.
    pub fn plan(&self) -> Result<CorrectionPlan> {
        let Some(approved_at) = self.approved_at else {
            return Err(CuratorError::PlanNotFrozen {
                pending: self.summary().pending,
            });
        };

        let entries = self
            .discrepancies
            .iter()
            .map(|d| {
                let decision = self
                    .decisions
                    .get(&d.id)
                    .cloned()
                    .unwrap_or_else(|| Decision::pending(d.id.clone()));
                let in_vocabulary = decision.value.as_deref().is_some_and(|v| {
                    self.catalog
                        .get(&d.property)
                        .is_some_and(|p| p.contains(v))
                });

                PlanEntry {
                    discrepancy_id: d.id.clone(),
                    column: d.column.clone(),
                    property: d.property.clone(),
                    value: d.value.clone(),
                    delimiter: d.delimiter.clone(),
                    entities: d.entities.clone(),
                    in_vocabulary,
                    decision,
                }
            })
            .collect();

        Ok(CorrectionPlan::new(
            self.version.clone(),
            approved_at,
            self.source.clone(),
            entries,
            self.cells.clone(),
        ))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_approved() {
            return Err(CuratorError::SessionClosed);
        }
        Ok(())
    }

    fn set_decision(&mut self, decision: Decision) -> Result<&Decision> {
        self.updated_at = Utc::now();
        let slot = self
            .decisions
            .entry(decision.discrepancy_id.clone())
            .or_insert_with(|| Decision::pending(decision.discrepancy_id.clone()));
        *slot = decision;
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertyDefinition;
    use crate::suggestion::SuggestionGenerator;
    use crate::validation::DiscrepancyDetector;

    fn session() -> ReviewSession {
        let catalog = PropertyCatalog::new().with_property(
            PropertyDefinition::new("Sex")
                .with_values(["Male", "Female", "Unknown"])
                .with_synonym("M", "Male"),
        );
        let table = DataTable::new(
            vec!["id".into(), "Sex".into()],
            vec![
                vec!["E1".into(), "male".into()],
                vec!["E2".into(), "Femle".into()],
                vec!["E3".into(), "M".into()],
                vec!["E4".into(), "zzzzzzzz".into()],
                vec!["E5".into(), "male".into()],
            ],
            b',',
        );

        let mut detection = DiscrepancyDetector::new(&catalog).detect_table(&table, None);
        SuggestionGenerator::new().annotate(&mut detection.discrepancies, &catalog);
        ReviewSession::new(catalog, detection, &table)
    }

    #[test]
    fn test_new_session_is_pending() {
        let session = session();
        let ids: Vec<&str> = session.list_discrepancies(None).iter().map(|d| d.id.as_str()).collect();

        assert_eq!(ids, vec!["disc_001", "disc_002", "disc_003"]);
        assert_eq!(session.summary().pending, 3);
        assert_eq!(session.progress(), 0.0);
        assert!(!session.can_approve());
        assert_eq!(session.next_pending().map(|d| d.value.as_str()), Some("male"));
    }

    #[test]
    fn test_accept_top_suggestion() {
        let mut session = session();
        let decision = session.accept("disc_001").unwrap();

        assert_eq!(decision.status, DecisionStatus::Accepted);
        assert_eq!(decision.value.as_deref(), Some("Male"));
    }

    #[test]
    fn test_accept_named_candidate_must_be_suggested() {
        let mut session = session();

        assert!(session.decide("disc_002", ReviewAction::Accept, Some("Female")).is_ok());
        assert!(matches!(
            session.decide("disc_002", ReviewAction::Accept, Some("Unknown")),
            Err(CuratorError::InvalidDecision(_))
        ));
    }

    #[test]
    fn test_accept_without_suggestions_fails() {
        let mut session = session();
        let id = session
            .list_discrepancies(None)
            .iter()
            .find(|d| d.value == "zzzzzzzz")
            .map(|d| d.id.clone())
            .unwrap();

        assert!(session.discrepancy(&id).unwrap().suggestions.is_empty());
        assert!(matches!(session.accept(&id), Err(CuratorError::InvalidDecision(_))));
        assert!(session.override_value(&id, "Unknown").is_ok());
    }

    #[test]
    fn test_override_requires_value() {
        let mut session = session();
        assert!(matches!(
            session.decide("disc_001", ReviewAction::Override, None),
            Err(CuratorError::InvalidDecision(_))
        ));
    }

    #[test]
    fn test_unknown_discrepancy() {
        let mut session = session();
        assert!(matches!(
            session.reject("disc_999"),
            Err(CuratorError::DiscrepancyNotFound(_))
        ));
    }

    #[test]
    fn test_reopen_and_approve() {
        let mut session = session();
        session.accept("disc_001").unwrap();
        session.reject("disc_002").unwrap();
        session.skip("disc_003").unwrap();
        assert!(session.can_approve());

        session.reopen("disc_002").unwrap();
        assert_eq!(session.status("disc_002"), DecisionStatus::Pending);
        assert!(matches!(
            session.approve(),
            Err(CuratorError::PlanNotFrozen { pending: 1 })
        ));

        session.accept("disc_002").unwrap();
        let plan = session.approve().unwrap();
        assert!(plan.is_frozen());
        assert_eq!(plan.touched_entities(), vec!["E1", "E5", "E2"]);
        assert_eq!(plan.cells()["E2"]["Sex"], "Femle");
    }

    #[test]
    fn test_closed_after_approve() {
        let mut session = session();
        session.reject_pending(None).unwrap();
        session.approve().unwrap();

        assert!(session.is_approved());
        assert!(!session.can_approve());
        assert!(matches!(session.accept("disc_001"), Err(CuratorError::SessionClosed)));
        assert!(matches!(session.reopen("disc_001"), Err(CuratorError::SessionClosed)));
        assert!(matches!(session.approve(), Err(CuratorError::SessionClosed)));
        assert!(session.plan().is_ok());
    }

    #[test]
    fn test_accept_above() {
        let mut session = session();
        let accepted = session.accept_above(0.9, None).unwrap();

        assert_eq!(accepted, 1);
        assert_eq!(session.status("disc_001"), DecisionStatus::Accepted);
        assert_eq!(session.status("disc_002"), DecisionStatus::Pending);

        assert_eq!(session.accept_above(0.4, Some("age")).unwrap(), 0);
        assert_eq!(session.accept_above(0.4, Some("Sex")).unwrap(), 1);
        assert_eq!(session.summary().changes(), 2);
    }

    #[test]
    fn test_new_terms_from_overrides() {
        let mut session = session();
        session.override_value("disc_001", "Male").unwrap();
        session.override_value("disc_002", "Intersex").unwrap();
        session.override_value("disc_003", "").unwrap();

        let terms = session.approve().unwrap().new_terms();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].value, "Intersex");
        assert_eq!(terms[0].property, "Sex");
    }
}
