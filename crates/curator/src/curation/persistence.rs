//! Persistence for sessions and plans - save/load JSON files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CuratorError, Result};

use super::plan::CorrectionPlan;
use super::session::ReviewSession;

impl ReviewSession {
    /// Save the session to a JSON file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use curator::curation::ReviewSession;
    /// # fn example(session: &ReviewSession) -> curator::Result<()> {
    /// session.save("metadata.session.json")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), self, "review session")
    }

    /// Load a session from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path.as_ref(), "review session")
    }
}

impl CorrectionPlan {
    /// Save the plan to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), self, "correction plan")
    }

    /// Load a plan from a JSON file.
    ///
    /// The plan is not checked here; applying it re-checks that no
    /// decision is pending.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path.as_ref(), "correction plan")
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<()> {
    // Create parent directory if needed
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                CuratorError::Persistence(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(path).map_err(|e| {
        CuratorError::Persistence(format!("Failed to create file '{}': {}", path.display(), e))
    })?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| CuratorError::Persistence(format!("Failed to serialize {}: {}", what, e)))?;
    writer.flush().map_err(|e| {
        CuratorError::Persistence(format!("Failed to write file '{}': {}", path.display(), e))
    })?;

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file = File::open(path).map_err(|e| {
        CuratorError::Persistence(format!("Failed to open file '{}': {}", path.display(), e))
    })?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| {
        CuratorError::Persistence(format!(
            "Failed to parse {} '{}': {}",
            what,
            path.display(),
            e
        ))
    })
}

/// Default session file path for a data file.
///
/// # Example
///
/// ```
/// use curator::curation::session_path;
///
/// let path = session_path("data/metadata.tsv");
/// assert_eq!(path.to_string_lossy(), "data/metadata.session.json");
/// ```
pub fn session_path(data_path: impl AsRef<Path>) -> PathBuf {
    sibling_path(data_path.as_ref(), "session.json")
}

/// Default plan file path for a data file.
///
/// # Example
///
/// ```
/// use curator::curation::plan_path;
///
/// let path = plan_path("data/metadata.tsv");
/// assert_eq!(path.to_string_lossy(), "data/metadata.plan.json");
/// ```
pub fn plan_path(data_path: impl AsRef<Path>) -> PathBuf {
    sibling_path(data_path.as_ref(), "plan.json")
}

fn sibling_path(data_path: &Path, suffix: &str) -> PathBuf {
    let stem = data_path.file_stem().unwrap_or_default().to_string_lossy();
    let parent = data_path.parent().unwrap_or(Path::new("."));

    parent.join(format!("{}.{}", stem, suffix))
}
