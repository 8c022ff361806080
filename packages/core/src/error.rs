//! Error taxonomy shared by the queue, the executor and the UI adapter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::AssignmentRecord;
use crate::task::{DuplicateKey, Length, PhotoKey};

/// Bad input shape, rejected before anything is queued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Hole ID must not be empty")]
    EmptyHoleId,
    #[error("Hole ID {0:?} contains characters a file name cannot hold")]
    InvalidHoleId(String),
    #[error("Invalid {field}: {value:?}")]
    InvalidLength { field: &'static str, value: String },
    #[error("{field} {value:?} has more than two decimal places")]
    TooPrecise { field: &'static str, value: String },
    #[error("{field} {value:?} is out of range (0 to 999999.99)")]
    LengthOutOfRange { field: &'static str, value: String },
    #[error("Bottom length {bottom} must be greater than top length {top}")]
    EmptyInterval { top: Length, bottom: Length },
    #[error("Invalid box ID: {0:?}")]
    InvalidBoxId(String),
    #[error("Invalid core size: {0:?}")]
    InvalidCoreSize(String),
    #[error("Source photo is missing: {0:?}")]
    MissingSourceFile(String),
}

/// Error categories reported to the UI adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    DuplicateEntry,
    Persistence,
    Rename,
    NotFound,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::DuplicateEntry => "duplicate_entry",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Rename => "rename",
            ErrorKind::NotFound => "not_found",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a submission did not enter the queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Duplicate entry: {0} already exists")]
    Duplicate(DuplicateKey),
    #[error("Duplicate entry: {0} is already waiting to be committed")]
    DuplicateInFlight(DuplicateKey),
    #[error("Record store unavailable: {0}")]
    Store(String),
    #[error("Assignment queue unavailable: {0}")]
    Unavailable(String),
}

impl SubmitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmitError::Validation(_) => ErrorKind::Validation,
            SubmitError::Duplicate(_) | SubmitError::DuplicateInFlight(_) => {
                ErrorKind::DuplicateEntry
            }
            SubmitError::Store(_) | SubmitError::Unavailable(_) => ErrorKind::Persistence,
        }
    }
}

/// Why a commit did not fully apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// The tuple was inserted by another path after submission.
    #[error("Duplicate entry: {0} already exists")]
    Duplicate(DuplicateKey),
    /// The source photo vanished before anything was written.
    #[error("Source photo not found: {0}")]
    NotFound(PhotoKey),
    /// A store or photo lookup failed before the record was written.
    #[error("Failed to save record: {0}")]
    Persistence(String),
    /// The record was written but the photo could not be renamed.
    #[error("Record {} saved but renaming {source_photo} failed: {message}", .record.id)]
    Rename {
        record: Box<AssignmentRecord>,
        source_photo: PhotoKey,
        message: String,
        /// The record was removed again by the compensating delete.
        rolled_back: bool,
    },
}

impl CommitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommitError::Duplicate(_) => ErrorKind::DuplicateEntry,
            CommitError::NotFound(_) => ErrorKind::NotFound,
            CommitError::Persistence(_) => ErrorKind::Persistence,
            CommitError::Rename { .. } => ErrorKind::Rename,
        }
    }
}
