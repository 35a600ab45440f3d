//! Decisions recorded against discrepancies.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review state of one discrepancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    /// Not yet reviewed.
    Pending,
    /// A suggested candidate was chosen.
    Accepted,
    /// The user supplied their own value.
    Overridden,
    /// The value is kept as is.
    Rejected,
    /// Deferred; the value is kept as is.
    Skipped,
}

impl DecisionStatus {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            DecisionStatus::Pending => "Pending",
            DecisionStatus::Accepted => "Accepted",
            DecisionStatus::Overridden => "Overridden",
            DecisionStatus::Rejected => "Rejected",
            DecisionStatus::Skipped => "Skipped",
        }
    }

    /// Check if this is a terminal decision (not pending).
    pub fn is_decided(&self) -> bool {
        !matches!(self, DecisionStatus::Pending)
    }

    /// Check if applying this decision changes data.
    pub fn changes_data(&self) -> bool {
        matches!(self, DecisionStatus::Accepted | DecisionStatus::Overridden)
    }
}

/// An action a reviewer takes on a discrepancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Accept,
    Override,
    Reject,
    Skip,
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReviewAction::Accept => "accept",
            ReviewAction::Override => "override",
            ReviewAction::Reject => "reject",
            ReviewAction::Skip => "skip",
        };
        f.write_str(name)
    }
}

impl FromStr for ReviewAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accept" | "a" => Ok(ReviewAction::Accept),
            "override" | "o" => Ok(ReviewAction::Override),
            "reject" | "r" => Ok(ReviewAction::Reject),
            "skip" | "s" => Ok(ReviewAction::Skip),
            other => Err(format!("unknown review action '{}'", other)),
        }
    }
}

/// The outcome bound to one discrepancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// ID of the discrepancy this decision addresses.
    pub discrepancy_id: String,

    /// Current status.
    pub status: DecisionStatus,

    /// Replacement value (accepted candidate or override).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// When the decision was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,

    /// Optional notes explaining the decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Decision {
    /// Create a pending decision.
    pub fn pending(discrepancy_id: impl Into<String>) -> Self {
        Self {
            discrepancy_id: discrepancy_id.into(),
            status: DecisionStatus::Pending,
            value: None,
            decided_at: None,
            notes: None,
        }
    }

    fn decided(discrepancy_id: impl Into<String>, status: DecisionStatus, value: Option<String>) -> Self {
        Self {
            discrepancy_id: discrepancy_id.into(),
            status,
            value,
            decided_at: Some(Utc::now()),
            notes: None,
        }
    }

    /// Create an acceptance of a suggested candidate.
    pub fn accepted(discrepancy_id: impl Into<String>, candidate: impl Into<String>) -> Self {
        Self::decided(discrepancy_id, DecisionStatus::Accepted, Some(candidate.into()))
    }

    /// Create an override with a user-supplied value.
    pub fn overridden(discrepancy_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::decided(discrepancy_id, DecisionStatus::Overridden, Some(value.into()))
    }

    /// Create a rejection.
    pub fn rejected(discrepancy_id: impl Into<String>) -> Self {
        Self::decided(discrepancy_id, DecisionStatus::Rejected, None)
    }

    /// Create a skip.
    pub fn skipped(discrepancy_id: impl Into<String>) -> Self {
        Self::decided(discrepancy_id, DecisionStatus::Skipped, None)
    }

    /// Set the decision notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// The value the discrepancy's cells change to, if any.
    pub fn replacement(&self) -> Option<&str> {
        if self.status.changes_data() {
            self.value.as_deref()
        } else {
            None
        }
    }
}
