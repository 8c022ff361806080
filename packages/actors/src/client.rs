//! Request/reply helpers over the queue actor's mailbox.

use boxtag_core::{
    AssignmentEvent, AssignmentRequest, AssignmentTask, Length, ManualEntry, ManualEntryDecision,
    QueueSnapshot, SubmitError, TaskId,
};
use ractor::{ActorRef, RpcReplyPort};
use tokio::sync::broadcast;

use crate::commit::CommitOutcome;
use crate::manual::ManualOutcome;
use crate::messages::{Accepted, AssignmentMessage};
use crate::ports::StoreError;
use crate::queue_actor::{AssignmentQueueArgs, start_assignment_queue};

/// The queue actor stopped or dropped the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Assignment queue unavailable: {0}")]
pub struct Unavailable(String);

/// Handle used by UI adapters to drive the queue.
#[derive(Clone)]
pub struct AssignmentClient {
    actor: ActorRef<AssignmentMessage>,
    events: broadcast::Sender<AssignmentEvent>,
}

impl AssignmentClient {
    pub fn new(actor: ActorRef<AssignmentMessage>, events: broadcast::Sender<AssignmentEvent>) -> Self {
        Self { actor, events }
    }

    /// Spawn a queue actor and wrap it.
    pub async fn start(
        args: AssignmentQueueArgs,
    ) -> Result<(Self, tokio::task::JoinHandle<()>), ractor::SpawnErr> {
        let events = args.event_tx.clone();
        let (actor, handle) = start_assignment_queue(args).await?;
        Ok((Self::new(actor, events), handle))
    }

    pub fn actor(&self) -> &ActorRef<AssignmentMessage> {
        &self.actor
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AssignmentEvent> {
        self.events.subscribe()
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(RpcReplyPort<T>) -> AssignmentMessage,
    ) -> Result<T, Unavailable>
    where
        T: Send + 'static,
    {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.actor
            .send_message(build(tx.into()))
            .map_err(|e| Unavailable(e.to_string()))?;
        rx.await.map_err(|e| Unavailable(e.to_string()))
    }

    pub async fn submit(&self, request: AssignmentRequest) -> Result<Accepted, SubmitError> {
        self.call(|reply| AssignmentMessage::Submit {
            request: Box::new(request),
            reply,
        })
        .await
        .map_err(|e| SubmitError::Unavailable(e.0))?
    }

    pub async fn cancel(&self) -> Result<Option<AssignmentTask>, Unavailable> {
        self.call(|reply| AssignmentMessage::Cancel { task_id: None, reply })
            .await
    }

    /// Cancel `task_id`, or nothing if another task is counting down by now.
    pub async fn cancel_task(&self, task_id: TaskId) -> Result<Option<AssignmentTask>, Unavailable> {
        self.call(|reply| AssignmentMessage::Cancel {
            task_id: Some(task_id),
            reply,
        })
        .await
    }

    /// Commit the current task now. `None` when nothing is counting down.
    pub async fn skip(&self) -> Result<Option<CommitOutcome>, Unavailable> {
        self.call(|reply| AssignmentMessage::Skip { task_id: None, reply })
            .await
    }

    pub async fn skip_task(&self, task_id: TaskId) -> Result<Option<CommitOutcome>, Unavailable> {
        self.call(|reply| AssignmentMessage::Skip {
            task_id: Some(task_id),
            reply,
        })
        .await
    }

    pub async fn snapshot(&self) -> Result<QueueSnapshot, Unavailable> {
        self.call(|reply| AssignmentMessage::GetSnapshot { reply }).await
    }

    pub async fn delete(&self, hole_id: impl Into<String>, top_length: Length) -> Result<usize, StoreError> {
        let hole_id = hole_id.into();
        self.call(|reply| AssignmentMessage::Delete {
            hole_id,
            top_length,
            reply,
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?
    }

    pub async fn resolve_manual_entry(
        &self,
        entry: ManualEntry,
        decision: ManualEntryDecision,
    ) -> Result<ManualOutcome, SubmitError> {
        self.call(|reply| AssignmentMessage::ResolveManualEntry {
            entry: Box::new(entry),
            decision,
            reply,
        })
        .await
        .map_err(|e| SubmitError::Unavailable(e.0))?
    }

    pub fn shutdown(&self) {
        if self.actor.send_message(AssignmentMessage::Shutdown).is_err() {
            tracing::debug!("Assignment queue already stopped");
        }
    }
}
