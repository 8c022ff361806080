//! Resolution of manually typed rows.

use boxtag_core::{AssignmentRecord, ManualEntry, ManualEntryDecision, SubmitError};

use crate::ports::{RecordStore, StoreError};

/// What happened to a manual row.
#[derive(Debug, Clone, PartialEq)]
pub enum ManualOutcome {
    Saved(AssignmentRecord),
    Discarded,
    /// The operator stays in edit mode with the row untouched.
    KeptEditing(ManualEntry),
}

/// Apply the operator's decision to a manual row.
///
/// Saving validates the cells and refuses a tuple the store already holds.
pub async fn resolve_manual_entry(
    store: &dyn RecordStore,
    entry: ManualEntry,
    decision: ManualEntryDecision,
) -> Result<ManualOutcome, SubmitError> {
    match decision {
        ManualEntryDecision::Discard => Ok(ManualOutcome::Discarded),
        ManualEntryDecision::Cancel => Ok(ManualOutcome::KeptEditing(entry)),
        ManualEntryDecision::Save => {
            let record = entry.to_record()?;
            let key = record.key();

            let exists = store
                .exists(key.clone())
                .await
                .map_err(|e| SubmitError::Store(e.to_string()))?;
            if exists {
                return Err(SubmitError::Duplicate(key));
            }

            match store.insert(record).await {
                Ok(saved) => {
                    tracing::info!("Saved manual record {} ({})", saved.id, saved.key());
                    Ok(ManualOutcome::Saved(saved))
                }
                Err(StoreError::Duplicate(key)) => Err(SubmitError::Duplicate(key)),
                Err(e) => Err(SubmitError::Store(e.to_string())),
            }
        }
    }
}
