//! Queue actor owning the assignment queue and its countdown gate.
//!
//! One actor per session. It handles one message at a time, so commits are
//! serialized and happen in acceptance order. The countdown ticker is a
//! separate tokio task that only sends [`AssignmentMessage::Tick`]; it is
//! cancelled whenever the task under the gate changes, and ticks that still
//! arrive afterwards are recognised as stale by their generation.

use std::sync::Arc;
use std::time::Duration;

use boxtag_core::{
    Admission, AssignmentEvent, AssignmentQueue, AssignmentRequest, AssignmentTask, CommitError,
    Countdown, QueueConfig, SubmitError, TickOutcome, ValidationError,
};
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::commit::{CommitExecutor, CommitOutcome};
use crate::manual::resolve_manual_entry;
use crate::messages::{Accepted, AssignmentMessage};
use crate::ports::{FileRenamer, RecordStore};

/// Arguments for spawning the queue actor.
pub struct AssignmentQueueArgs {
    pub config: QueueConfig,
    pub store: Arc<dyn RecordStore>,
    pub renamer: Arc<dyn FileRenamer>,
    pub event_tx: broadcast::Sender<AssignmentEvent>,
    /// Cancelling this token stops every ticker the actor started.
    pub shutdown: CancellationToken,
}

impl AssignmentQueueArgs {
    pub fn new(
        config: QueueConfig,
        store: Arc<dyn RecordStore>,
        renamer: Arc<dyn FileRenamer>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        Self {
            config,
            store,
            renamer,
            event_tx,
            shutdown: CancellationToken::new(),
        }
    }

    /// Set the event broadcaster.
    pub fn with_event_tx(mut self, tx: broadcast::Sender<AssignmentEvent>) -> Self {
        self.event_tx = tx;
        self
    }

    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }
}

/// State for the queue actor.
pub struct AssignmentQueueState {
    queue: AssignmentQueue,
    config: QueueConfig,
    store: Arc<dyn RecordStore>,
    renamer: Arc<dyn FileRenamer>,
    executor: CommitExecutor,
    event_tx: broadcast::Sender<AssignmentEvent>,
    shutdown: CancellationToken,
    /// Ticker of the current countdown, if one is running.
    ticker: Option<CancellationToken>,
}

impl AssignmentQueueState {
    pub fn new(args: AssignmentQueueArgs) -> Self {
        let executor = CommitExecutor::new(args.store.clone(), args.renamer.clone())
            .with_rename_failure(args.config.rename_failure)
            .with_placeholder_marker(args.config.placeholder_marker.clone());

        Self {
            queue: AssignmentQueue::new(&args.config),
            config: args.config,
            store: args.store,
            renamer: args.renamer,
            executor,
            event_tx: args.event_tx,
            shutdown: args.shutdown,
            ticker: None,
        }
    }

    fn broadcast(&self, event: AssignmentEvent) {
        tracing::debug!("{}", event.description());
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    fn start_ticker(&mut self, myself: &ActorRef<AssignmentMessage>, countdown: &Countdown) {
        self.stop_ticker();

        let token = self.shutdown.child_token();
        self.ticker = Some(token.clone());

        let period = self.config.tick_period();
        let generation = countdown.generation;
        let myself = myself.clone();
        tokio::spawn(run_ticker(myself, period, generation, token));
    }

    /// Announce the countdown the queue just started.
    fn begin(&mut self, myself: &ActorRef<AssignmentMessage>, countdown: Countdown) {
        self.start_ticker(myself, &countdown);
        if let Some(task) = self.queue.current().cloned() {
            self.broadcast(AssignmentEvent::CountdownStarted {
                task,
                remaining: countdown.remaining,
                timestamp: Utc::now(),
            });
        }
    }

    /// Start the next pending task, or report that the queue drained.
    fn advance(&mut self, myself: &ActorRef<AssignmentMessage>) {
        match self.queue.advance() {
            Some(countdown) => self.begin(myself, countdown),
            None => self.broadcast(AssignmentEvent::Idle {
                timestamp: Utc::now(),
            }),
        }
    }

    async fn submit(
        &mut self,
        myself: &ActorRef<AssignmentMessage>,
        request: &AssignmentRequest,
    ) -> Result<Accepted, SubmitError> {
        let task = AssignmentTask::from_request(request)?;

        let present = self
            .renamer
            .exists(task.source.clone())
            .await
            .map_err(|e| SubmitError::Store(e.to_string()))?;
        if !present {
            return Err(ValidationError::MissingSourceFile(task.source.to_string()).into());
        }

        let key = task.key();
        let stored = self
            .store
            .exists(key.clone())
            .await
            .map_err(|e| SubmitError::Store(e.to_string()))?;
        if stored {
            return Err(SubmitError::Duplicate(key));
        }
        if self.config.reject_in_flight_duplicates && self.queue.contains_key(&key) {
            return Err(SubmitError::DuplicateInFlight(key));
        }

        let admission = self.queue.enqueue(task.clone());
        match &admission {
            Admission::Started(countdown) => self.begin(myself, countdown.clone()),
            Admission::Queued { position } => self.broadcast(AssignmentEvent::TaskQueued {
                task: task.clone(),
                position: *position,
                timestamp: Utc::now(),
            }),
        }

        Ok(Accepted { task, admission })
    }

    /// Run the executor on the task under the gate, then move on.
    async fn commit(
        &mut self,
        myself: &ActorRef<AssignmentMessage>,
        task: AssignmentTask,
    ) -> CommitOutcome {
        self.stop_ticker();

        let outcome = self.executor.execute(&task).await;
        self.queue.finish_commit();

        match &outcome {
            Ok(committed) => {
                tracing::info!("Committed {} as {}", committed.record.key(), committed.photo);
                self.broadcast(AssignmentEvent::Committed {
                    task_id: task.id,
                    record: committed.record.clone(),
                    photo: committed.photo.clone(),
                    next_placeholder: committed.next_placeholder.clone(),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                tracing::warn!("Commit of {} failed: {}", task.key(), e);
                let record = match e {
                    CommitError::Rename {
                        record,
                        rolled_back: false,
                        ..
                    } => Some(record.as_ref().clone()),
                    _ => None,
                };
                self.broadcast(AssignmentEvent::Failed {
                    task_id: task.id,
                    kind: e.kind(),
                    message: e.to_string(),
                    record,
                    timestamp: Utc::now(),
                });
            }
        }

        self.advance(myself);
        outcome
    }
}

async fn run_ticker(
    actor: ActorRef<AssignmentMessage>,
    period: Duration,
    generation: u64,
    token: CancellationToken,
) {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {
                if actor.send_message(AssignmentMessage::Tick { generation }).is_err() {
                    break;
                }
            }
        }
    }
}

/// Actor driving the assignment queue.
pub struct AssignmentQueueActor;

impl Actor for AssignmentQueueActor {
    type Msg = AssignmentMessage;
    type State = AssignmentQueueState;
    type Arguments = AssignmentQueueArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            "Starting assignment queue ({} ticks of {} ms)",
            args.config.grace(),
            args.config.tick_period().as_millis()
        );
        Ok(AssignmentQueueState::new(args))
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.stop_ticker();
        tracing::info!("Assignment queue stopped");
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            AssignmentMessage::Submit { request, reply } => {
                let result = state.submit(&myself, &request).await;
                if let Err(e) = &result {
                    tracing::info!("Submission rejected: {}", e);
                }
                let _ = reply.send(result);
            }

            AssignmentMessage::Cancel { task_id, reply } => {
                let cancelled = if state.queue.targets_current(task_id) {
                    state.queue.cancel()
                } else {
                    tracing::debug!("Ignoring cancel aimed at finished task {:?}", task_id);
                    None
                };
                if let Some(task) = &cancelled {
                    state.stop_ticker();
                    state.broadcast(AssignmentEvent::Cancelled {
                        task: task.clone(),
                        timestamp: Utc::now(),
                    });
                    state.advance(&myself);
                }
                let _ = reply.send(cancelled);
            }

            AssignmentMessage::Skip { task_id, reply } => {
                let task = if state.queue.targets_current(task_id) {
                    state.queue.skip()
                } else {
                    tracing::debug!("Ignoring skip aimed at finished task {:?}", task_id);
                    None
                };
                let outcome = match task {
                    Some(task) => Some(state.commit(&myself, task).await),
                    None => None,
                };
                let _ = reply.send(outcome);
            }

            AssignmentMessage::Tick { generation } => match state.queue.tick(generation) {
                TickOutcome::Stale => {
                    tracing::trace!("Ignoring stale tick of countdown {}", generation);
                }
                TickOutcome::Counting { task_id, remaining } => {
                    state.broadcast(AssignmentEvent::CountdownTick {
                        task_id,
                        remaining,
                        timestamp: Utc::now(),
                    });
                }
                TickOutcome::Commit(task) => {
                    state.commit(&myself, task).await;
                }
            },

            AssignmentMessage::Delete {
                hole_id,
                top_length,
                reply,
            } => {
                let result = state.store.delete(hole_id, top_length).await;
                let _ = reply.send(result);
            }

            AssignmentMessage::ResolveManualEntry {
                entry,
                decision,
                reply,
            } => {
                let result = resolve_manual_entry(state.store.as_ref(), *entry, decision).await;
                let _ = reply.send(result);
            }

            AssignmentMessage::GetSnapshot { reply } => {
                let _ = reply.send(state.queue.snapshot());
            }

            AssignmentMessage::Shutdown => {
                tracing::info!("Shutting down assignment queue");
                state.stop_ticker();
                myself.stop(None);
            }
        }

        Ok(())
    }
}

/// Spawn the queue actor.
pub async fn start_assignment_queue(
    args: AssignmentQueueArgs,
) -> Result<(ActorRef<AssignmentMessage>, tokio::task::JoinHandle<()>), ractor::SpawnErr> {
    Actor::spawn(None, AssignmentQueueActor, args).await
}
