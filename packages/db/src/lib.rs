//! SurrealDB integration for core box assignment records.
//!
//! This crate provides database connectivity and the repository for
//! persisting committed assignments.
//!
//! # Features
//!
//! - `memory` (default): Use in-memory storage for testing
//! - `rocksdb`: Use RocksDB for persistent file-based storage

mod connection;
mod schema;
pub mod repositories;

pub use connection::{Database, DbConfig, DbError, connect_db};
pub use repositories::RecordRepository;
pub use schema::init_schema;

/// Open a dedicated connection, apply the schema and wrap it in a repository.
pub async fn open(config: &DbConfig) -> Result<RecordRepository, DbError> {
    let db = connect_db(config).await?;
    init_schema(&db).await?;
    Ok(RecordRepository::new(db))
}
