//! Photo storage used by the commit pipeline.
//!
//! Goal:
//! - On-disk storage rooted at the operator's photo directory
//! - In-memory storage for tests
//!
//! Photos are addressed by [`PhotoKey`], relative to the store root. This is a
//! small wrapper around `object_store`, which already provides the local
//! filesystem and in-memory backends.

use std::path::PathBuf;
use std::sync::Arc;

use boxtag_core::PhotoKey;
use bytes::Bytes;
use futures_util::TryStreamExt;
use object_store::ObjectStore;
use object_store::ObjectStoreExt;
use object_store::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage config: {0}")]
    InvalidConfig(String),

    #[error("invalid photo key: {0}")]
    InvalidKey(PhotoKey),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object_store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}

/// Why a photo could not be renamed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenameError {
    #[error("file does not exist: {0}")]
    NotFound(PhotoKey),

    #[error("target already exists: {0}")]
    TargetExists(PhotoKey),

    #[error("failed to rename {key}: {message}")]
    Denied { key: PhotoKey, message: String },
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
    Filesystem { root: PathBuf },
    Memory,
}

impl StorageConfig {
    pub fn memory() -> Self {
        Self::Memory
    }

    pub fn filesystem(root: impl Into<PathBuf>) -> Self {
        Self::Filesystem { root: root.into() }
    }
}

#[derive(Clone)]
pub struct PhotoStore {
    store: Arc<dyn ObjectStore>,
}

impl PhotoStore {
    pub fn new(cfg: StorageConfig) -> Result<Self, StorageError> {
        let store: Arc<dyn ObjectStore> = match cfg {
            StorageConfig::Filesystem { root } => {
                if !root.is_dir() {
                    return Err(StorageError::InvalidConfig(format!(
                        "photo directory {} does not exist",
                        root.display()
                    )));
                }
                tracing::info!("Photo store ready (filesystem at {})", root.display());
                Arc::new(object_store::local::LocalFileSystem::new_with_prefix(&root)?)
            }
            StorageConfig::Memory => {
                tracing::info!("Photo store ready (memory)");
                Arc::new(object_store::memory::InMemory::new())
            }
        };

        Ok(Self { store })
    }

    /// Map a key onto a store path verbatim. `Path::from` would percent-encode
    /// characters such as `#` or `[`, so the file on disk would not carry the key's name.
    fn to_path(&self, key: &PhotoKey) -> Result<Path, StorageError> {
        let raw = key.as_str().trim_start_matches('/');
        if raw.is_empty() {
            return Err(StorageError::InvalidKey(key.clone()));
        }
        Path::parse(raw).map_err(|_| StorageError::InvalidKey(key.clone()))
    }

    /// Check whether a photo exists.
    pub async fn exists(&self, key: &PhotoKey) -> Result<bool, StorageError> {
        let path = self.to_path(key)?;
        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Rename a photo within its directory, refusing to overwrite another file.
    ///
    /// Renaming a photo onto its own name is a no-op.
    pub async fn rename(&self, source: &PhotoKey, file_name: &str) -> Result<PhotoKey, RenameError> {
        let target = source.with_file_name(file_name);
        let denied = |message: String| RenameError::Denied {
            key: source.clone(),
            message,
        };

        let from = self.to_path(source).map_err(|e| denied(e.to_string()))?;
        let to = self.to_path(&target).map_err(|e| denied(e.to_string()))?;

        if from == to {
            return match self.exists(source).await {
                Ok(true) => Ok(target),
                Ok(false) => Err(RenameError::NotFound(source.clone())),
                Err(e) => Err(denied(e.to_string())),
            };
        }

        match self.store.rename_if_not_exists(&from, &to).await {
            Ok(()) => {
                tracing::debug!("Renamed {} to {}", source, target);
                Ok(target)
            }
            Err(object_store::Error::NotFound { .. }) => Err(RenameError::NotFound(source.clone())),
            Err(object_store::Error::AlreadyExists { .. }) => Err(RenameError::TargetExists(target)),
            Err(e) => Err(denied(e.to_string())),
        }
    }

    /// All photo keys, sorted by name.
    pub async fn list(&self) -> Result<Vec<PhotoKey>, StorageError> {
        let metas: Vec<_> = self.store.list(None).try_collect().await?;

        let mut keys: Vec<PhotoKey> = metas
            .into_iter()
            .map(|m| key_of(&m.location))
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// First photo, by name, whose file name contains `marker`.
    pub async fn first_with_marker(&self, marker: &str) -> Result<Option<PhotoKey>, StorageError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|k| k.file_name().contains(marker)))
    }

    pub async fn put_bytes(&self, key: &PhotoKey, bytes: Bytes) -> Result<(), StorageError> {
        let path = self.to_path(key)?;
        self.store
            .put(&path, object_store::PutPayload::from(bytes))
            .await?;
        Ok(())
    }

    pub async fn get_bytes(&self, key: &PhotoKey) -> Result<Bytes, StorageError> {
        let path = self.to_path(key)?;
        let res = self.store.get(&path).await?;
        Ok(res.bytes().await?)
    }
}

fn key_of(location: &Path) -> PhotoKey {
    let names: Vec<String> = location.parts().map(|p| p.as_ref().to_owned()).collect();
    PhotoKey::new(names.join("/"))
}
