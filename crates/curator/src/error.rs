//! Error types for the curator library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for curator operations.
///
/// Per-entity write failures during the apply phase are not represented
/// here; they are collected into [`crate::apply::ApplyResult`] instead.
#[derive(Debug, Error)]
pub enum CuratorError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The schema document does not have the expected node shape.
    #[error("Schema parse error: {0}")]
    SchemaParse(String),

    /// The schema document could not be fetched.
    #[error("Failed to fetch schema from '{source_url}': {message}")]
    SchemaFetch { source_url: String, message: String },

    /// Empty file or no data to check.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// A column was requested that the snapshot does not have.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A review action named a discrepancy the session does not own.
    #[error("Discrepancy '{0}' not found")]
    DiscrepancyNotFound(String),

    /// A review action is not valid for the discrepancy it targets.
    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    /// The session has been approved and no longer accepts changes.
    #[error("Review session is closed: the correction plan has already been approved")]
    SessionClosed,

    /// A plan still holds pending decisions.
    #[error("Correction plan is not frozen: {pending} decision(s) still pending")]
    PlanNotFrozen { pending: usize },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Saving or loading a session or plan failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Result type alias for curator operations.
pub type Result<T> = std::result::Result<T, CuratorError>;
