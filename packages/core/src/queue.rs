//! Assignment queue and countdown gate state machine.
//!
//! Every transition is a plain method over [`AssignmentQueue`]; the caller
//! owns timing and side effects. A task moves
//! `pending -> current (Counting) -> Committing -> gone`, or is cancelled
//! while Counting.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::task::{AssignmentTask, DuplicateKey, TaskId};

/// What to do with an inserted record when the photo rename fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameFailurePolicy {
    /// Keep the record and report the rename error.
    #[default]
    KeepRecord,
    /// Delete the inserted record again before reporting.
    RollBack,
}

/// Configuration for queue and gate behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Number of ticks a task waits before it is committed.
    pub grace_ticks: u32,
    /// Tick period in milliseconds.
    pub tick_millis: u64,
    /// Reject a submission whose tuple is already pending or current.
    pub reject_in_flight_duplicates: bool,
    /// Handling of a record whose photo could not be renamed.
    pub rename_failure: RenameFailurePolicy,
    /// File name marker of photos that still need an assignment.
    pub placeholder_marker: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            grace_ticks: 5,
            tick_millis: 1000,
            reject_in_flight_duplicates: true,
            rename_failure: RenameFailurePolicy::KeepRecord,
            placeholder_marker: "IMG_".to_string(),
        }
    }
}

impl QueueConfig {
    /// Tick period as a duration.
    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_millis.max(1))
    }

    /// Grace period in ticks, never zero.
    pub fn grace(&self) -> u32 {
        self.grace_ticks.max(1)
    }
}

/// State of the countdown gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    /// No task in flight.
    #[default]
    Idle,
    /// The current task can still be cancelled.
    Counting { remaining: u32 },
    /// The current task's effects are being applied.
    Committing,
}

impl GateState {
    pub fn is_idle(&self) -> bool {
        matches!(self, GateState::Idle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GateState::Idle => "idle",
            GateState::Counting { .. } => "counting",
            GateState::Committing => "committing",
        }
    }
}

/// A countdown that just started for the task pulled into `current`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub task_id: TaskId,
    pub remaining: u32,
    /// Increases with every countdown; ticks from older countdowns are stale.
    pub generation: u64,
}

/// Result of accepting a task into the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The gate was idle and the task went straight under the countdown.
    Started(Countdown),
    /// The task waits behind the current one; `position` is 1-based within `pending`.
    Queued { position: usize },
}

/// Result of one timer tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still counting down.
    Counting { task_id: TaskId, remaining: u32 },
    /// Grace period exhausted; the gate is now Committing this task.
    Commit(AssignmentTask),
    /// The tick belongs to a countdown that no longer exists.
    Stale,
}

/// Read-only view of the queue for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub gate: GateState,
    pub current: Option<AssignmentTask>,
    pub pending: Vec<AssignmentTask>,
}

impl QueueSnapshot {
    /// Tasks not yet committed or cancelled.
    pub fn in_flight(&self) -> usize {
        self.pending.len() + usize::from(self.current.is_some())
    }
}

/// The process-lifetime queue of assignment tasks.
#[derive(Debug, Default)]
pub struct AssignmentQueue {
    grace: u32,
    pending: VecDeque<AssignmentTask>,
    current: Option<AssignmentTask>,
    gate: GateState,
    generation: u64,
}

impl AssignmentQueue {
    /// Create an empty, idle queue.
    pub fn new(config: &QueueConfig) -> Self {
        Self {
            grace: config.grace(),
            ..Default::default()
        }
    }

    pub fn gate(&self) -> GateState {
        self.gate
    }

    pub fn current(&self) -> Option<&AssignmentTask> {
        self.current.as_ref()
    }

    /// Whether an action aimed at `expected` applies to the task under the gate.
    /// `None` aims at whichever task that is.
    pub fn targets_current(&self, expected: Option<TaskId>) -> bool {
        match expected {
            None => true,
            Some(id) => self.current.as_ref().is_some_and(|t| t.id == id),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Generation of the most recent countdown.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Check whether a tuple is already pending or under the gate.
    pub fn contains_key(&self, key: &DuplicateKey) -> bool {
        self.current
            .iter()
            .chain(self.pending.iter())
            .any(|t| &t.key() == key)
    }

    /// Append a task. Starts its countdown only when the gate is idle.
    pub fn enqueue(&mut self, task: AssignmentTask) -> Admission {
        self.pending.push_back(task);
        match self.advance() {
            Some(countdown) => Admission::Started(countdown),
            None => Admission::Queued {
                position: self.pending.len(),
            },
        }
    }

    /// Pull the next pending task under the gate.
    ///
    /// Does nothing unless the gate is idle; goes (or stays) idle when
    /// nothing is pending.
    pub fn advance(&mut self) -> Option<Countdown> {
        if !self.gate.is_idle() {
            return None;
        }
        let task = self.pending.pop_front()?;
        self.generation += 1;
        let countdown = Countdown {
            task_id: task.id,
            remaining: self.grace,
            generation: self.generation,
        };
        self.current = Some(task);
        self.gate = GateState::Counting {
            remaining: self.grace,
        };
        Some(countdown)
    }

    /// Apply one timer tick of the countdown identified by `generation`.
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if generation != self.generation {
            return TickOutcome::Stale;
        }
        let GateState::Counting { remaining } = self.gate else {
            return TickOutcome::Stale;
        };
        let Some(task) = self.current.as_ref() else {
            return TickOutcome::Stale;
        };

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.gate = GateState::Committing;
            TickOutcome::Commit(task.clone())
        } else {
            self.gate = GateState::Counting { remaining };
            TickOutcome::Counting {
                task_id: task.id,
                remaining,
            }
        }
    }

    /// Withdraw the current task. Only possible while Counting.
    ///
    /// Leaves the gate idle; call [`advance`](Self::advance) to start the next task.
    pub fn cancel(&mut self) -> Option<AssignmentTask> {
        if !matches!(self.gate, GateState::Counting { .. }) {
            return None;
        }
        self.gate = GateState::Idle;
        self.current.take()
    }

    /// Commit the current task now instead of waiting. Only possible while Counting.
    pub fn skip(&mut self) -> Option<AssignmentTask> {
        if !matches!(self.gate, GateState::Counting { .. }) {
            return None;
        }
        self.gate = GateState::Committing;
        self.current.clone()
    }

    /// Leave Committing once the executor has finished, whatever its outcome.
    ///
    /// Leaves the gate idle; call [`advance`](Self::advance) to start the next task.
    pub fn finish_commit(&mut self) -> Option<AssignmentTask> {
        if self.gate != GateState::Committing {
            return None;
        }
        self.gate = GateState::Idle;
        self.current.take()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            gate: self.gate,
            current: self.current.clone(),
            pending: self.pending.iter().cloned().collect(),
        }
    }
}
