use db::{DbConfig, DbError, RecordRepository};

/// Fresh in-memory database per test; `mem://` endpoints never share state.
pub async fn setup_repo() -> Result<RecordRepository, DbError> {
    db::open(&DbConfig::memory().with_database("test")).await
}
