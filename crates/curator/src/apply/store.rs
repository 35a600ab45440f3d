//! The remote-store seam and an in-memory table implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::input::DataTable;

use super::result::ApplyError;

/// One cell rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChange {
    pub column: String,
    /// Cell value the plan was built from.
    pub from: String,
    /// Cell value to write.
    pub to: String,
}

/// All cell rewrites for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityUpdate {
    pub entity: String,
    pub changes: Vec<CellChange>,
}

/// A store entities can be updated in.
///
/// Implementations must treat an update whose `to` value is already
/// present as a success, so a failed subset can be re-applied safely.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Write every change of one entity, or none of them.
    async fn update_entity(&self, update: &EntityUpdate) -> Result<(), ApplyError>;
}

/// An [`EntityStore`] over an in-memory snapshot.
///
/// Yields the corrected snapshot once the apply run is over.
pub struct TableStore {
    table: Mutex<DataTable>,
}

impl TableStore {
    /// Wrap a snapshot.
    pub fn new(table: DataTable) -> Self {
        Self {
            table: Mutex::new(table),
        }
    }

    /// A copy of the current snapshot.
    pub async fn snapshot(&self) -> DataTable {
        self.table.lock().await.clone()
    }

    /// Unwrap the snapshot.
    pub fn into_table(self) -> DataTable {
        self.table.into_inner()
    }
}

#[async_trait]
impl EntityStore for TableStore {
    async fn update_entity(&self, update: &EntityUpdate) -> Result<(), ApplyError> {
        let mut table = self.table.lock().await;

        let row = table.row_for_key(&update.entity).ok_or_else(|| ApplyError::NotFound {
            entity: update.entity.clone(),
        })?;

        // Check every change before writing any
        let mut writes = Vec::with_capacity(update.changes.len());
        for change in &update.changes {
            let col = table.column_index(&change.column).ok_or_else(|| ApplyError::Rejected {
                message: format!("unknown column '{}'", change.column),
            })?;
            let current = table.get(row, col).unwrap_or("");

            if current == change.to {
                continue;
            }
            if current != change.from {
                return Err(ApplyError::Conflict {
                    column: change.column.clone(),
                    expected: change.from.clone(),
                    found: current.to_string(),
                });
            }
            writes.push((col, change.to.clone()));
        }

        for (col, value) in writes {
            table.set(row, col, value);
        }

        debug!(entity = %update.entity, changes = update.changes.len(), "Updated entity");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TableStore {
        TableStore::new(DataTable::new(
            vec!["id".into(), "Sex".into(), "tissue".into()],
            vec![
                vec!["E1".into(), "male".into(), "Blood;bloood".into()],
                vec!["E2".into(), "Femle".into(), "Skin".into()],
            ],
            b',',
        ))
    }

    fn change(column: &str, from: &str, to: &str) -> CellChange {
        CellChange {
            column: column.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    #[tokio::test]
    async fn test_update_writes_all_changes() {
        let store = store();
        let update = EntityUpdate {
            entity: "E1".into(),
            changes: vec![change("Sex", "male", "Male"), change("tissue", "Blood;bloood", "Blood;Blood")],
        };

        store.update_entity(&update).await.unwrap();
        let table = store.into_table();
        assert_eq!(table.get(0, 1), Some("Male"));
        assert_eq!(table.get(0, 2), Some("Blood;Blood"));
    }

    #[tokio::test]
    async fn test_reapply_is_success() {
        let store = store();
        let update = EntityUpdate {
            entity: "E2".into(),
            changes: vec![change("Sex", "Femle", "Female")],
        };

        store.update_entity(&update).await.unwrap();
        store.update_entity(&update).await.unwrap();
        assert_eq!(store.snapshot().await.get(1, 1), Some("Female"));
    }

    #[tokio::test]
    async fn test_conflict_writes_nothing() {
        let store = store();
        let update = EntityUpdate {
            entity: "E1".into(),
            changes: vec![change("tissue", "Blood;bloood", "Blood;Blood"), change("Sex", "Male ", "Male")],
        };

        let err = store.update_entity(&update).await.unwrap_err();
        assert!(matches!(err, ApplyError::Conflict { ref column, .. } if column == "Sex"));
        assert_eq!(store.snapshot().await.get(0, 2), Some("Blood;bloood"));
    }

    #[tokio::test]
    async fn test_unknown_entity_and_column() {
        let store = store();

        let missing = EntityUpdate {
            entity: "E9".into(),
            changes: vec![change("Sex", "male", "Male")],
        };
        assert_eq!(
            store.update_entity(&missing).await,
            Err(ApplyError::NotFound { entity: "E9".into() })
        );

        let bad_column = EntityUpdate {
            entity: "E1".into(),
            changes: vec![change("age", "1", "2")],
        };
        assert!(matches!(
            store.update_entity(&bad_column).await,
            Err(ApplyError::Rejected { .. })
        ));
    }
}
