#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use actors::{AssignmentClient, AssignmentQueueArgs, FileRenamer, PortFuture, RecordStore, StoreError};
use boxtag_core::{
    AssignmentEvent, AssignmentRecord, AssignmentRequest, CoreSize, DuplicateKey, HoleFilter,
    Length, NewRecord, PhotoKey, QueueConfig, RecordId,
};
use bytes::Bytes;
use chrono::Utc;
use db::{DbConfig, RecordRepository};
use storage::{PhotoStore, StorageConfig};
use tokio::sync::broadcast;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Ticks fast enough that a whole countdown takes a few tens of milliseconds.
pub fn fast_config() -> QueueConfig {
    QueueConfig {
        tick_millis: 10,
        ..QueueConfig::default()
    }
}

/// Ticks slow enough that nothing commits on its own during a test.
pub fn frozen_config() -> QueueConfig {
    QueueConfig {
        tick_millis: 60_000,
        ..QueueConfig::default()
    }
}

pub fn request(hole_id: &str, top: &str, bottom: &str, box_id: u32, photo: &str) -> AssignmentRequest {
    AssignmentRequest {
        hole_id: hole_id.to_string(),
        top_length: top.to_string(),
        bottom_length: bottom.to_string(),
        box_id: box_id.to_string(),
        core_size: CoreSize::HalfCore,
        source: Some(PhotoKey::new(photo)),
    }
}

pub async fn photos(names: &[&str]) -> Result<PhotoStore, storage::StorageError> {
    let store = PhotoStore::new(StorageConfig::memory())?;
    for name in names {
        store
            .put_bytes(&PhotoKey::new(*name), Bytes::from_static(b"jpeg"))
            .await?;
    }
    Ok(store)
}

/// A running queue wired to an in-memory database and photo store.
pub struct Harness {
    pub client: AssignmentClient,
    pub repo: RecordRepository,
    pub photos: PhotoStore,
    pub events: broadcast::Receiver<AssignmentEvent>,
}

impl Harness {
    pub async fn start(config: QueueConfig, photo_names: &[&str]) -> Result<Self, Box<dyn std::error::Error>> {
        let repo = db::open(&DbConfig::memory().with_database("test")).await?;
        let photos = photos(photo_names).await?;
        let args = AssignmentQueueArgs::new(config, Arc::new(repo.clone()), Arc::new(photos.clone()));
        let (client, _handle) = AssignmentClient::start(args).await?;
        let events = client.subscribe();

        Ok(Self {
            client,
            repo,
            photos,
            events,
        })
    }

    /// Wait for the first event matching `pred`, returning it.
    pub async fn expect(&mut self, pred: impl Fn(&AssignmentEvent) -> bool) -> AssignmentEvent {
        self.collect_until(pred).await.pop().unwrap()
    }

    /// Collect events up to and including the first one matching `pred`.
    pub async fn collect_until(&mut self, pred: impl Fn(&AssignmentEvent) -> bool) -> Vec<AssignmentEvent> {
        let mut seen = Vec::new();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let event = tokio::time::timeout_at(deadline, self.events.recv())
                .await
                .unwrap_or_else(|_| panic!("timed out waiting for event; saw {seen:#?}"))
                .unwrap();
            let done = pred(&event);
            seen.push(event);
            if done {
                return seen;
            }
        }
    }

    pub async fn photo_exists(&self, name: &str) -> bool {
        self.photos.exists(&PhotoKey::new(name)).await.unwrap()
    }
}

pub fn is_committed(event: &AssignmentEvent) -> bool {
    matches!(event, AssignmentEvent::Committed { .. })
}

pub fn is_failed(event: &AssignmentEvent) -> bool {
    matches!(event, AssignmentEvent::Failed { .. })
}

pub fn is_idle(event: &AssignmentEvent) -> bool {
    matches!(event, AssignmentEvent::Idle { .. })
}

/// Record store double that keeps rows in a vector and can refuse writes.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<AssignmentRecord>>,
    fail_inserts: bool,
}

impl MemoryRecordStore {
    pub fn failing() -> Self {
        Self {
            fail_inserts: true,
            ..Default::default()
        }
    }

    pub fn records(&self) -> Vec<AssignmentRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert(&self, record: NewRecord) -> PortFuture<'_, Result<AssignmentRecord, StoreError>> {
        Box::pin(async move {
            if self.fail_inserts {
                return Err(StoreError::Backend("disk full".to_string()));
            }
            let mut records = self.records.lock().unwrap();
            if records.iter().any(|r| r.key() == record.key()) {
                return Err(StoreError::Duplicate(record.key()));
            }
            let saved = AssignmentRecord::from_new(RecordId::new(), record, Utc::now());
            records.push(saved.clone());
            Ok(saved)
        })
    }

    fn exists(&self, key: DuplicateKey) -> PortFuture<'_, Result<bool, StoreError>> {
        Box::pin(async move { Ok(self.records.lock().unwrap().iter().any(|r| r.key() == key)) })
    }

    fn delete(&self, hole_id: String, top_length: Length) -> PortFuture<'_, Result<usize, StoreError>> {
        Box::pin(async move {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| !(r.hole_id == hole_id && r.top_length == top_length));
            Ok(before - records.len())
        })
    }

    fn delete_by_id(&self, id: RecordId) -> PortFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| r.id != id);
            if records.len() == before {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Ok(())
        })
    }

    fn list(&self, filter: HoleFilter) -> PortFuture<'_, Result<Vec<AssignmentRecord>, StoreError>> {
        Box::pin(async move {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| filter.matches(&r.hole_id))
                .cloned()
                .collect())
        })
    }

    fn hole_ids(&self) -> PortFuture<'_, Result<Vec<String>, StoreError>> {
        Box::pin(async move {
            let mut ids: Vec<String> = self
                .records
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.hole_id.clone())
                .collect();
            ids.sort();
            ids.dedup();
            Ok(ids)
        })
    }
}

/// Photo store whose renames are always refused, as on a read-only share.
pub struct ReadOnlyPhotos(pub PhotoStore);

impl FileRenamer for ReadOnlyPhotos {
    fn exists(&self, photo: PhotoKey) -> PortFuture<'_, Result<bool, StoreError>> {
        FileRenamer::exists(&self.0, photo)
    }

    fn rename(&self, photo: PhotoKey, _file_name: String) -> PortFuture<'_, Result<PhotoKey, actors::RenameError>> {
        Box::pin(async move {
            Err(actors::RenameError::Denied {
                key: photo,
                message: "permission denied".to_string(),
            })
        })
    }

    fn first_placeholder(&self, marker: String) -> PortFuture<'_, Result<Option<PhotoKey>, StoreError>> {
        FileRenamer::first_placeholder(&self.0, marker)
    }

    fn list(&self) -> PortFuture<'_, Result<Vec<PhotoKey>, StoreError>> {
        FileRenamer::list(&self.0)
    }
}

/// Photo store whose lookups fail, as when the share drops mid-session.
pub struct UnreachablePhotos;

impl FileRenamer for UnreachablePhotos {
    fn exists(&self, _photo: PhotoKey) -> PortFuture<'_, Result<bool, StoreError>> {
        Box::pin(async { Err(StoreError::Backend("network share unreachable".to_string())) })
    }

    fn rename(&self, photo: PhotoKey, _file_name: String) -> PortFuture<'_, Result<PhotoKey, actors::RenameError>> {
        Box::pin(async move { Err(actors::RenameError::NotFound(photo)) })
    }

    fn first_placeholder(&self, _marker: String) -> PortFuture<'_, Result<Option<PhotoKey>, StoreError>> {
        Box::pin(async { Ok(None) })
    }

    fn list(&self) -> PortFuture<'_, Result<Vec<PhotoKey>, StoreError>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}
