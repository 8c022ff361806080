//! Seams between the queue actor and the outside world.
//!
//! The actor only talks to a [`RecordStore`] and a [`FileRenamer`]; the
//! production implementations live in [`adapters`](crate::adapters) and tests
//! plug in in-memory doubles.

use std::future::Future;
use std::pin::Pin;

use boxtag_core::{AssignmentRecord, DuplicateKey, HoleFilter, Length, NewRecord, PhotoKey, RecordId};

pub use storage::RenameError;

/// Future type returned by port methods.
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors reported by a port other than a failed rename.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Duplicate entry: {0} already exists")]
    Duplicate(DuplicateKey),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}

/// Persistent home of committed records.
pub trait RecordStore: Send + Sync + 'static {
    /// Insert a record; the tuple must not exist yet.
    fn insert(&self, record: NewRecord) -> PortFuture<'_, Result<AssignmentRecord, StoreError>>;

    fn exists(&self, key: DuplicateKey) -> PortFuture<'_, Result<bool, StoreError>>;

    /// Delete every record of `hole_id` starting at `top_length`, returning how many went.
    fn delete(
        &self,
        hole_id: String,
        top_length: Length,
    ) -> PortFuture<'_, Result<usize, StoreError>>;

    fn delete_by_id(&self, id: RecordId) -> PortFuture<'_, Result<(), StoreError>>;

    /// Records in insertion order.
    fn list(&self, filter: HoleFilter) -> PortFuture<'_, Result<Vec<AssignmentRecord>, StoreError>>;

    /// Distinct hole IDs, sorted.
    fn hole_ids(&self) -> PortFuture<'_, Result<Vec<String>, StoreError>>;
}

/// Photo directory operations needed by the commit pipeline.
pub trait FileRenamer: Send + Sync + 'static {
    fn exists(&self, photo: PhotoKey) -> PortFuture<'_, Result<bool, StoreError>>;

    /// Rename `photo` to `file_name` in the same directory, returning the new key.
    fn rename(
        &self,
        photo: PhotoKey,
        file_name: String,
    ) -> PortFuture<'_, Result<PhotoKey, RenameError>>;

    /// First photo, by name, whose file name contains `marker`.
    fn first_placeholder(&self, marker: String) -> PortFuture<'_, Result<Option<PhotoKey>, StoreError>>;

    /// All photos, sorted by name.
    fn list(&self) -> PortFuture<'_, Result<Vec<PhotoKey>, StoreError>>;
}
