//! Core domain types for the core box assignment pipeline.
//!
//! This crate contains shared types used across all packages:
//! - `AssignmentTask` and `Length` for validated user requests
//! - `AssignmentRecord` for committed assignments
//! - `AssignmentQueue` and `GateState` for the delayed-commit state machine
//! - Events for notifying the UI adapter

mod entry;
mod error;
mod events;
mod queue;
mod record;
mod task;

pub use entry::{ManualEntry, ManualEntryDecision};
pub use error::{CommitError, ErrorKind, SubmitError, ValidationError};
pub use events::AssignmentEvent;
pub use queue::{
    Admission, AssignmentQueue, Countdown, GateState, QueueConfig, QueueSnapshot,
    RenameFailurePolicy, TickOutcome,
};
pub use record::{AssignmentRecord, HoleFilter, NewRecord, RecordId};
pub use task::{AssignmentRequest, AssignmentTask, CoreSize, DuplicateKey, Length, PhotoKey, TaskId};
