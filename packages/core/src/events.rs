//! Event types delivered to the UI adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::record::AssignmentRecord;
use crate::task::{AssignmentTask, PhotoKey, TaskId};

/// Events emitted by the assignment queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AssignmentEvent {
    /// A task was accepted behind the current one.
    TaskQueued {
        task: AssignmentTask,
        position: usize,
        timestamp: DateTime<Utc>,
    },
    /// A task moved under the gate and its grace period began.
    CountdownStarted {
        task: AssignmentTask,
        remaining: u32,
        timestamp: DateTime<Utc>,
    },
    /// One tick of the grace period elapsed.
    CountdownTick {
        task_id: TaskId,
        remaining: u32,
        timestamp: DateTime<Utc>,
    },
    /// A task's record was saved and its photo renamed.
    Committed {
        task_id: TaskId,
        record: AssignmentRecord,
        photo: PhotoKey,
        /// First photo still carrying the placeholder marker, if any.
        next_placeholder: Option<PhotoKey>,
        timestamp: DateTime<Utc>,
    },
    /// The current task was withdrawn; nothing was written.
    Cancelled {
        task: AssignmentTask,
        timestamp: DateTime<Utc>,
    },
    /// A task could not be (fully) committed.
    Failed {
        task_id: TaskId,
        kind: ErrorKind,
        message: String,
        /// Set when the record was written before the failure and kept.
        record: Option<AssignmentRecord>,
        timestamp: DateTime<Utc>,
    },
    /// Nothing left to commit.
    Idle { timestamp: DateTime<Utc> },
}

impl AssignmentEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            AssignmentEvent::TaskQueued { timestamp, .. } => *timestamp,
            AssignmentEvent::CountdownStarted { timestamp, .. } => *timestamp,
            AssignmentEvent::CountdownTick { timestamp, .. } => *timestamp,
            AssignmentEvent::Committed { timestamp, .. } => *timestamp,
            AssignmentEvent::Cancelled { timestamp, .. } => *timestamp,
            AssignmentEvent::Failed { timestamp, .. } => *timestamp,
            AssignmentEvent::Idle { timestamp } => *timestamp,
        }
    }

    /// Get the task ID associated with this event, if any.
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            AssignmentEvent::TaskQueued { task, .. } => Some(task.id),
            AssignmentEvent::CountdownStarted { task, .. } => Some(task.id),
            AssignmentEvent::CountdownTick { task_id, .. } => Some(*task_id),
            AssignmentEvent::Committed { task_id, .. } => Some(*task_id),
            AssignmentEvent::Cancelled { task, .. } => Some(task.id),
            AssignmentEvent::Failed { task_id, .. } => Some(*task_id),
            AssignmentEvent::Idle { .. } => None,
        }
    }

    /// Get a short description of this event for display.
    pub fn description(&self) -> String {
        match self {
            AssignmentEvent::TaskQueued { task, position, .. } => format!(
                "Queued {} (position {})",
                task.canonical_stem(),
                position
            ),
            AssignmentEvent::CountdownStarted { task, remaining, .. } => format!(
                "Assigning {} to {} - Cancel ({})",
                task.source,
                task.canonical_stem(),
                remaining
            ),
            AssignmentEvent::CountdownTick { remaining, .. } => format!("Cancel ({})", remaining),
            AssignmentEvent::Committed { record, photo, .. } => format!(
                "Saved {} {}-{} ({} m, box {}) as {}",
                record.hole_id,
                record.top_length,
                record.bottom_length,
                record.total_length,
                record.box_id,
                photo
            ),
            AssignmentEvent::Cancelled { task, .. } => {
                format!("Cancelled {}", task.canonical_stem())
            }
            AssignmentEvent::Failed { kind, message, .. } => format!("Error ({}): {}", kind, message),
            AssignmentEvent::Idle { .. } => "Queue idle".to_string(),
        }
    }

    /// Serialize the event as a single JSON line.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
