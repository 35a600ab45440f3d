//! Per-entity apply outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::store::{CellChange, EntityUpdate};

/// Why one entity's update failed.
///
/// These never abort an apply run; each is recorded in the failing
/// entity's [`ApplyResult`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApplyError {
    /// The store has no entity with this key.
    #[error("entity '{entity}' not found")]
    NotFound { entity: String },

    /// The cell no longer holds the value the plan was built from.
    #[error("column '{column}' changed since review: expected '{expected}', found '{found}'")]
    Conflict {
        column: String,
        expected: String,
        found: String,
    },

    /// The store could not be reached.
    #[error("network error: {message}")]
    Network { message: String },

    /// The store refused the update.
    #[error("update rejected: {message}")]
    Rejected { message: String },

    /// Cancellation arrived before the update was dispatched.
    #[error("cancelled before dispatch")]
    Cancelled,
}

/// Outcome of applying the plan to one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Entity key.
    pub entity: String,
    /// Whether the update was written.
    pub success: bool,
    /// Failure detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApplyError>,
    /// The cell changes that were (or would have been) written.
    pub changes: Vec<CellChange>,
}

impl ApplyResult {
    /// A successful update.
    pub fn success(update: EntityUpdate) -> Self {
        Self {
            entity: update.entity,
            success: true,
            error: None,
            changes: update.changes,
        }
    }

    /// A failed update.
    pub fn failure(update: EntityUpdate, error: ApplyError) -> Self {
        Self {
            entity: update.entity,
            success: false,
            error: Some(error),
            changes: update.changes,
        }
    }

    /// Human-readable failure detail.
    pub fn error_detail(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Whether the entity was never dispatched.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, Some(ApplyError::Cancelled))
    }
}

/// Complete outcome of an apply run: one result per touched entity, in
/// plan order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyReport {
    pub results: Vec<ApplyResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ApplyReport {
    /// Number of entities in the report.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the plan touched no entities.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of successful updates.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Number of failed updates, including cancelled ones.
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }

    /// Number of entities never dispatched.
    pub fn cancelled(&self) -> usize {
        self.results.iter().filter(|r| r.is_cancelled()).count()
    }

    /// Keys of every entity whose update did not succeed.
    pub fn failed_entities(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.entity.clone())
            .collect()
    }

    /// Result for one entity.
    pub fn result_for(&self, entity: &str) -> Option<&ApplyResult> {
        self.results.iter().find(|r| r.entity == entity)
    }

    /// Whether every entity was updated.
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }
}
