//! Port implementations backed by SurrealDB and `object_store`.

use boxtag_core::{AssignmentRecord, DuplicateKey, HoleFilter, Length, NewRecord, PhotoKey, RecordId};
use db::{DbError, RecordRepository};
use storage::{PhotoStore, RenameError, StorageError};

use crate::ports::{FileRenamer, PortFuture, RecordStore, StoreError};

fn store_error(err: DbError) -> StoreError {
    match err {
        DbError::NotFound(what) => StoreError::NotFound(what),
        other => StoreError::Backend(other.to_string()),
    }
}

fn photo_error(err: StorageError) -> StoreError {
    StoreError::Backend(err.to_string())
}

impl RecordStore for RecordRepository {
    fn insert(&self, record: NewRecord) -> PortFuture<'_, Result<AssignmentRecord, StoreError>> {
        Box::pin(async move {
            match RecordRepository::insert(self, &record).await {
                Ok(created) => Ok(created),
                Err(DbError::Duplicate(_)) => Err(StoreError::Duplicate(record.key())),
                Err(e) => Err(store_error(e)),
            }
        })
    }

    fn exists(&self, key: DuplicateKey) -> PortFuture<'_, Result<bool, StoreError>> {
        Box::pin(async move { RecordRepository::exists(self, &key).await.map_err(store_error) })
    }

    fn delete(
        &self,
        hole_id: String,
        top_length: Length,
    ) -> PortFuture<'_, Result<usize, StoreError>> {
        Box::pin(async move {
            RecordRepository::delete(self, &hole_id, top_length)
                .await
                .map_err(store_error)
        })
    }

    fn delete_by_id(&self, id: RecordId) -> PortFuture<'_, Result<(), StoreError>> {
        Box::pin(async move { RecordRepository::delete_by_id(self, id).await.map_err(store_error) })
    }

    fn list(&self, filter: HoleFilter) -> PortFuture<'_, Result<Vec<AssignmentRecord>, StoreError>> {
        Box::pin(async move { RecordRepository::list(self, &filter).await.map_err(store_error) })
    }

    fn hole_ids(&self) -> PortFuture<'_, Result<Vec<String>, StoreError>> {
        Box::pin(async move { RecordRepository::hole_ids(self).await.map_err(store_error) })
    }
}

impl FileRenamer for PhotoStore {
    fn exists(&self, photo: PhotoKey) -> PortFuture<'_, Result<bool, StoreError>> {
        Box::pin(async move { PhotoStore::exists(self, &photo).await.map_err(photo_error) })
    }

    fn rename(
        &self,
        photo: PhotoKey,
        file_name: String,
    ) -> PortFuture<'_, Result<PhotoKey, RenameError>> {
        Box::pin(async move { PhotoStore::rename(self, &photo, &file_name).await })
    }

    fn first_placeholder(&self, marker: String) -> PortFuture<'_, Result<Option<PhotoKey>, StoreError>> {
        Box::pin(async move {
            PhotoStore::first_with_marker(self, &marker)
                .await
                .map_err(photo_error)
        })
    }

    fn list(&self) -> PortFuture<'_, Result<Vec<PhotoKey>, StoreError>> {
        Box::pin(async move { PhotoStore::list(self).await.map_err(photo_error) })
    }
}
