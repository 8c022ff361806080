//! Commit executor: applies one assignment to the record store and the photo directory.

use std::sync::Arc;

use boxtag_core::{AssignmentRecord, AssignmentTask, CommitError, NewRecord, PhotoKey, RenameFailurePolicy};

use crate::ports::{FileRenamer, RecordStore, StoreError};

/// Result of a fully applied commit.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed {
    pub record: AssignmentRecord,
    /// Photo key after the rename.
    pub photo: PhotoKey,
    pub next_placeholder: Option<PhotoKey>,
}

pub type CommitOutcome = Result<Committed, CommitError>;

#[derive(Clone)]
pub struct CommitExecutor {
    store: Arc<dyn RecordStore>,
    renamer: Arc<dyn FileRenamer>,
    rename_failure: RenameFailurePolicy,
    placeholder_marker: String,
}

impl CommitExecutor {
    pub fn new(store: Arc<dyn RecordStore>, renamer: Arc<dyn FileRenamer>) -> Self {
        Self {
            store,
            renamer,
            rename_failure: RenameFailurePolicy::default(),
            placeholder_marker: "IMG_".to_string(),
        }
    }

    pub fn with_rename_failure(mut self, policy: RenameFailurePolicy) -> Self {
        self.rename_failure = policy;
        self
    }

    pub fn with_placeholder_marker(mut self, marker: impl Into<String>) -> Self {
        self.placeholder_marker = marker.into();
        self
    }

    /// Commit `task`. Each failing step aborts the ones after it.
    pub async fn execute(&self, task: &AssignmentTask) -> CommitOutcome {
        let key = task.key();

        match self.store.exists(key.clone()).await {
            Ok(false) => {}
            Ok(true) => return Err(CommitError::Duplicate(key)),
            Err(e) => return Err(CommitError::Persistence(e.to_string())),
        }

        match self.renamer.exists(task.source.clone()).await {
            Ok(true) => {}
            Ok(false) => return Err(CommitError::NotFound(task.source.clone())),
            Err(e) => {
                return Err(CommitError::Persistence(format!(
                    "could not look up {}: {}",
                    task.source, e
                )));
            }
        }

        let record = match self.store.insert(NewRecord::from_task(task)).await {
            Ok(record) => record,
            Err(StoreError::Duplicate(key)) => return Err(CommitError::Duplicate(key)),
            Err(e) => return Err(CommitError::Persistence(e.to_string())),
        };

        let photo = match self
            .renamer
            .rename(task.source.clone(), task.canonical_file_name())
            .await
        {
            Ok(photo) => photo,
            Err(e) => {
                tracing::warn!("Rename of {} failed after saving {}: {}", task.source, record.id, e);
                let rolled_back = self.roll_back(&record).await;
                return Err(CommitError::Rename {
                    record: Box::new(record),
                    source_photo: task.source.clone(),
                    message: e.to_string(),
                    rolled_back,
                });
            }
        };

        let next_placeholder = match self
            .renamer
            .first_placeholder(self.placeholder_marker.clone())
            .await
        {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!("Placeholder lookup failed: {}", e);
                None
            }
        };

        tracing::debug!("Committed {} as {}", record.id, photo);
        Ok(Committed {
            record,
            photo,
            next_placeholder,
        })
    }

    async fn roll_back(&self, record: &AssignmentRecord) -> bool {
        if self.rename_failure != RenameFailurePolicy::RollBack {
            return false;
        }
        match self.store.delete_by_id(record.id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Compensating delete of {} failed: {}", record.id, e);
                false
            }
        }
    }
}
