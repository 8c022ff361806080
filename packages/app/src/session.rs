//! Executes terminal commands against the queue, the record store and the photos.

use std::sync::Arc;

use actors::{AssignmentClient, CommitOutcome, FileRenamer, ManualOutcome, RecordStore, Unavailable};
use boxtag_core::{
    Admission, AssignmentEvent, AssignmentRecord, AssignmentTask, GateState, ManualEntryDecision,
    QueueSnapshot, TaskId,
};

use crate::commands::{Command, HELP};

/// What the input loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    client: AssignmentClient,
    store: Arc<dyn RecordStore>,
    photos: Arc<dyn FileRenamer>,
    json: bool,
    /// Task the operator last saw counting down; `cancel` and `skip` aim at it.
    on_gate: Option<TaskId>,
}

impl Session {
    pub fn new(
        client: AssignmentClient,
        store: Arc<dyn RecordStore>,
        photos: Arc<dyn FileRenamer>,
    ) -> Self {
        Self {
            client,
            store,
            photos,
            json: false,
            on_gate: None,
        }
    }

    /// Print events as JSON lines instead of prose.
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn client(&self) -> &AssignmentClient {
        &self.client
    }

    pub fn render_event(&mut self, event: &AssignmentEvent) -> String {
        match event {
            AssignmentEvent::CountdownStarted { task, .. } => self.on_gate = Some(task.id),
            AssignmentEvent::Idle { .. } => self.on_gate = None,
            _ => {}
        }

        if self.json {
            match event.to_json_line() {
                Ok(line) => return line,
                Err(e) => tracing::warn!("Failed to encode event: {}", e),
            }
        }
        match event {
            AssignmentEvent::Committed {
                next_placeholder: Some(next),
                ..
            } => format!("{}\nnext photo: {}", event.description(), next),
            AssignmentEvent::Committed {
                next_placeholder: None,
                ..
            } => format!("{}\nno photos left to assign", event.description()),
            _ => event.description(),
        }
    }

    /// Run one command, returning the lines to print.
    pub async fn execute(&self, command: Command) -> (Flow, Vec<String>) {
        let lines = match command {
            Command::Quit => return (Flow::Quit, Vec::new()),
            Command::Help => vec![HELP.to_string()],

            Command::Submit(request) => match self.client.submit(request).await {
                Ok(accepted) => match accepted.admission {
                    Admission::Started(_) => Vec::new(),
                    Admission::Queued { position } => {
                        vec![format!("queued at position {}", position)]
                    }
                },
                Err(e) => vec![format!("Error ({}): {}", e.kind(), e)],
            },

            Command::Add(entry) => {
                match self
                    .client
                    .resolve_manual_entry(entry, ManualEntryDecision::Save)
                    .await
                {
                    Ok(ManualOutcome::Saved(record)) => vec![format!("saved {}", row(&record))],
                    Ok(_) => Vec::new(),
                    Err(e) => vec![format!("Error ({}): {}", e.kind(), e)],
                }
            }

            Command::Cancel => match self.cancel().await {
                Ok(Some(_)) => Vec::new(),
                Ok(None) => vec!["nothing to cancel".to_string()],
                Err(e) => vec![e.to_string()],
            },

            Command::Skip => match self.skip().await {
                Ok(Some(_)) => Vec::new(),
                Ok(None) => vec!["nothing to skip".to_string()],
                Err(e) => vec![e.to_string()],
            },

            Command::Status => match self.client.snapshot().await {
                Ok(snapshot) => status_lines(&snapshot),
                Err(e) => vec![e.to_string()],
            },

            Command::List(filter) => match self.store.list(filter).await {
                Ok(records) if records.is_empty() => vec!["no records".to_string()],
                Ok(records) => records.iter().map(row).collect(),
                Err(e) => vec![format!("Error: {}", e)],
            },

            Command::Holes => match self.store.hole_ids().await {
                Ok(holes) => std::iter::once("All".to_string()).chain(holes).collect(),
                Err(e) => vec![format!("Error: {}", e)],
            },

            Command::Photos => match self.photos.list().await {
                Ok(photos) => photos.into_iter().map(|p| p.to_string()).collect(),
                Err(e) => vec![format!("Error: {}", e)],
            },

            Command::Delete {
                hole_id,
                top_length,
            } => match self.client.delete(hole_id.clone(), top_length).await {
                Ok(0) => vec![format!("no record of {} at {}", hole_id, top_length)],
                Ok(n) => vec![format!("deleted {} record(s) of {} at {}", n, hole_id, top_length)],
                Err(e) => vec![format!("Error: {}", e)],
            },
        };

        (Flow::Continue, lines)
    }

    async fn cancel(&self) -> Result<Option<AssignmentTask>, Unavailable> {
        match self.on_gate {
            Some(id) => self.client.cancel_task(id).await,
            None => self.client.cancel().await,
        }
    }

    async fn skip(&self) -> Result<Option<CommitOutcome>, Unavailable> {
        match self.on_gate {
            Some(id) => self.client.skip_task(id).await,
            None => self.client.skip().await,
        }
    }
}

fn row(record: &AssignmentRecord) -> String {
    format!(
        "{:<10} {:>8} {:>8} {:>7} box {:<4} {:<10} {}",
        record.hole_id,
        record.top_length.to_string(),
        record.bottom_length.to_string(),
        record.total_length.to_string(),
        record.box_id,
        record.core_size.as_str(),
        record.modified_at.format("%Y-%m-%d %H:%M:%S")
    )
}

fn status_lines(snapshot: &QueueSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    let gate = match snapshot.gate {
        GateState::Counting { remaining } => format!("counting ({} left)", remaining),
        other => other.as_str().to_string(),
    };
    lines.push(format!("gate: {}", gate));
    if let Some(task) = &snapshot.current {
        lines.push(format!("current: {} <- {}", task.canonical_stem(), task.source));
    }
    for (i, task) in snapshot.pending.iter().enumerate() {
        lines.push(format!("  {}. {} <- {}", i + 1, task.canonical_stem(), task.source));
    }
    lines
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;
    use actors::AssignmentQueueArgs;
    use boxtag_core::{PhotoKey, QueueConfig};
    use bytes::Bytes;
    use db::DbConfig;
    use storage::{PhotoStore, StorageConfig};

    async fn session(photo_names: &[&str]) -> Session {
        let repo = Arc::new(db::open(&DbConfig::memory().with_database("test")).await.unwrap());
        let photos = PhotoStore::new(StorageConfig::memory()).unwrap();
        for name in photo_names {
            photos
                .put_bytes(&PhotoKey::new(*name), Bytes::from_static(b"jpeg"))
                .await
                .unwrap();
        }
        let photos = Arc::new(photos);
        let config = QueueConfig {
            tick_millis: 60_000,
            ..QueueConfig::default()
        };
        let args = AssignmentQueueArgs::new(config, repo.clone(), photos.clone());
        let (client, _handle) = AssignmentClient::start(args).await.unwrap();
        Session::new(client, repo, photos)
    }

    async fn run(session: &Session, line: &str) -> Vec<String> {
        let command = Command::parse(line).unwrap().unwrap();
        session.execute(command).await.1
    }

    #[tokio::test]
    async fn submit_skip_then_list() {
        let session = session(&["IMG_0001.jpg", "IMG_0002.jpg"]).await;

        assert!(run(&session, "submit H1 0 1.5 3 IMG_0001.jpg").await.is_empty());
        assert_eq!(
            run(&session, "submit H1 1.5 3 4 IMG_0002.jpg").await,
            vec!["queued at position 1"]
        );

        let status = run(&session, "status").await;
        assert_eq!(status[0], "gate: counting (5 left)");
        assert_eq!(status[1], "current: H1_0.00-1.50 <- IMG_0001.jpg");

        assert!(run(&session, "skip").await.is_empty());

        let records = run(&session, "list H1").await;
        assert_eq!(records.len(), 1);
        assert!(records[0].starts_with("H1"));

        let photos = run(&session, "photos").await;
        assert_eq!(photos, vec!["H1_0.00-1.50.jpg", "IMG_0002.jpg"]);

        assert_eq!(run(&session, "holes").await, vec!["All", "H1"]);
    }

    #[tokio::test]
    async fn cancel_aims_at_the_task_last_shown() {
        let mut session = session(&["IMG_0001.jpg", "IMG_0002.jpg"]).await;
        let mut events = session.client().subscribe();

        run(&session, "submit H1 0 1.5 3 IMG_0001.jpg").await;
        let started = events.recv().await.unwrap();
        session.render_event(&started);

        run(&session, "submit H1 1.5 3 4 IMG_0002.jpg").await;
        // H1 0-1.5 commits through another path before the operator's cancel
        session.client().skip().await.unwrap().unwrap().unwrap();

        assert_eq!(run(&session, "cancel").await, vec!["nothing to cancel"]);
        let status = run(&session, "status").await;
        assert_eq!(status[1], "current: H1_1.50-3.00 <- IMG_0002.jpg");
    }

    #[tokio::test]
    async fn errors_are_reported_not_fatal() {
        let session = session(&[]).await;

        let lines = run(&session, "submit H1 2 1 3 IMG_0001.jpg").await;
        assert!(lines[0].starts_with("Error (validation)"));

        assert_eq!(run(&session, "cancel").await, vec!["nothing to cancel"]);
        assert_eq!(run(&session, "list").await, vec!["no records"]);
        assert_eq!(
            run(&session, "delete H1 0").await,
            vec!["no record of H1 at 0.00"]
        );
    }

    #[tokio::test]
    async fn add_then_delete() {
        let session = session(&[]).await;

        let saved = run(&session, "add H9 3 4.5 2 whole").await;
        assert!(saved[0].starts_with("saved H9"));

        let duplicate = run(&session, "add H9 3 4.5 2 whole").await;
        assert!(duplicate[0].starts_with("Error (duplicate_entry)"));

        assert_eq!(
            run(&session, "delete H9 3").await,
            vec!["deleted 1 record(s) of H9 at 3.00"]
        );
        assert_eq!(session.execute(Command::Quit).await.0, Flow::Quit);
    }
}
