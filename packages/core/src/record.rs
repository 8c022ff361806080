//! Committed assignment records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::task::{AssignmentTask, CoreSize, DuplicateKey, Length};

/// Unique identifier for a persisted record, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Ulid);

impl RecordId {
    /// Create a new unique record ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a record ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Record content handed to the store, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub hole_id: String,
    pub top_length: Length,
    pub bottom_length: Length,
    pub total_length: Length,
    pub box_id: u32,
    pub core_size: CoreSize,
}

impl NewRecord {
    /// Build the record for a task, deriving `total_length`.
    pub fn from_task(task: &AssignmentTask) -> Self {
        Self {
            hole_id: task.hole_id.clone(),
            top_length: task.top_length,
            bottom_length: task.bottom_length,
            total_length: task.total_length(),
            box_id: task.box_id,
            core_size: task.core_size,
        }
    }

    pub fn key(&self) -> DuplicateKey {
        DuplicateKey {
            hole_id: self.hole_id.clone(),
            top_length: self.top_length,
            bottom_length: self.bottom_length,
            box_id: self.box_id,
        }
    }
}

/// The persisted form of a committed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Store-assigned identifier.
    pub id: RecordId,
    pub hole_id: String,
    pub top_length: Length,
    pub bottom_length: Length,
    /// Always `bottom_length - top_length`.
    pub total_length: Length,
    pub box_id: u32,
    pub core_size: CoreSize,
    /// When the record was inserted.
    pub created_at: DateTime<Utc>,
    /// When the record was last changed.
    pub modified_at: DateTime<Utc>,
}

impl AssignmentRecord {
    /// Attach an identity and timestamps to new record content.
    pub fn from_new(id: RecordId, record: NewRecord, now: DateTime<Utc>) -> Self {
        Self {
            id,
            hole_id: record.hole_id,
            top_length: record.top_length,
            bottom_length: record.bottom_length,
            total_length: record.total_length,
            box_id: record.box_id,
            core_size: record.core_size,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn key(&self) -> DuplicateKey {
        DuplicateKey {
            hole_id: self.hole_id.clone(),
            top_length: self.top_length,
            bottom_length: self.bottom_length,
            box_id: self.box_id,
        }
    }
}

/// Hole selection for record listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoleFilter {
    #[default]
    All,
    Hole(String),
}

impl HoleFilter {
    /// `"All"` (any case) selects every hole, anything else a single one.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            HoleFilter::All
        } else {
            HoleFilter::Hole(s.to_string())
        }
    }

    pub fn matches(&self, hole_id: &str) -> bool {
        match self {
            HoleFilter::All => true,
            HoleFilter::Hole(h) => h == hole_id,
        }
    }
}
