//! Actor layer for the core box assignment queue.
//!
//! # Architecture
//!
//! - `AssignmentQueueActor` - owns the queue and countdown gate, runs commits
//! - `CommitExecutor` - applies one task to the record store and photo directory
//! - `RecordStore` / `FileRenamer` - ports, implemented for `db` and `storage`
//!
//! # Usage
//!
//! ```ignore
//! use actors::{AssignmentClient, AssignmentQueueArgs};
//!
//! let args = AssignmentQueueArgs::new(config, Arc::new(repo), Arc::new(photos));
//! let (client, handle) = AssignmentClient::start(args).await?;
//! let mut events = client.subscribe();
//! client.submit(request).await?;
//! ```

mod adapters;
mod client;
mod commit;
mod manual;
mod messages;
mod ports;
mod queue_actor;

pub use client::{AssignmentClient, Unavailable};
pub use commit::{CommitExecutor, CommitOutcome, Committed};
pub use manual::{ManualOutcome, resolve_manual_entry};
pub use messages::{Accepted, AssignmentMessage};
pub use ports::{FileRenamer, PortFuture, RecordStore, RenameError, StoreError};
pub use queue_actor::{
    AssignmentQueueActor, AssignmentQueueArgs, AssignmentQueueState, start_assignment_queue,
};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, concurrency};
