//! Message types for actor communication.

use boxtag_core::{
    Admission, AssignmentRequest, AssignmentTask, Length, ManualEntry, ManualEntryDecision,
    QueueSnapshot, SubmitError, TaskId,
};
use ractor::RpcReplyPort;

use crate::commit::CommitOutcome;
use crate::manual::ManualOutcome;
use crate::ports::StoreError;

/// A submission that entered the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    pub task: AssignmentTask,
    pub admission: Admission,
}

/// Messages for the AssignmentQueueActor.
#[derive(Debug)]
pub enum AssignmentMessage {
    /// Validate a request and append it to the queue.
    Submit {
        request: Box<AssignmentRequest>,
        reply: RpcReplyPort<Result<Accepted, SubmitError>>,
    },

    /// Withdraw the task under the countdown. With `task_id` set, only if
    /// that task is still the one counting down.
    Cancel {
        task_id: Option<TaskId>,
        reply: RpcReplyPort<Option<AssignmentTask>>,
    },

    /// Commit the task under the countdown now, under the same `task_id` rule as `Cancel`.
    Skip {
        task_id: Option<TaskId>,
        reply: RpcReplyPort<Option<CommitOutcome>>,
    },

    /// Timer tick for the countdown started as `generation`.
    Tick { generation: u64 },

    /// Delete committed records of a hole at a top length.
    Delete {
        hole_id: String,
        top_length: Length,
        reply: RpcReplyPort<Result<usize, StoreError>>,
    },

    /// Resolve a manually typed row.
    ResolveManualEntry {
        entry: Box<ManualEntry>,
        decision: ManualEntryDecision,
        reply: RpcReplyPort<Result<ManualOutcome, SubmitError>>,
    },

    /// Get the gate state and queued tasks.
    GetSnapshot { reply: RpcReplyPort<QueueSnapshot> },

    /// Stop the ticker and the actor. Pending tasks are dropped.
    Shutdown,
}
