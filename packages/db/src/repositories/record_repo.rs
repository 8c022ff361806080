//! Record repository for assignment persistence.

use boxtag_core::{AssignmentRecord, CoreSize, DuplicateKey, HoleFilter, Length, NewRecord, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::{Database, DbError};

const TABLE: &str = "core_box";

/// Repository for assignment record persistence operations.
#[derive(Clone)]
pub struct RecordRepository {
    db: Database,
}

/// Internal record type for SurrealDB reads.
#[derive(Debug, Deserialize)]
struct RecordRow {
    id: Option<Thing>,
    hole_id: String,
    top_length: Length,
    bottom_length: Length,
    total_length: Length,
    box_id: u32,
    core_size: CoreSize,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl RecordRow {
    fn record_id(&self) -> Result<RecordId, DbError> {
        let raw = self
            .id
            .as_ref()
            .map(|t| t.id.to_raw())
            .ok_or_else(|| DbError::Query("record row without id".into()))?;
        RecordId::parse(&raw).map_err(|e| DbError::Query(format!("bad record id {raw}: {e}")))
    }

    fn into_record(self) -> Result<AssignmentRecord, DbError> {
        let id = self.record_id()?;
        Ok(AssignmentRecord {
            id,
            hole_id: self.hole_id,
            top_length: self.top_length,
            bottom_length: self.bottom_length,
            total_length: self.total_length,
            box_id: self.box_id,
            core_size: self.core_size,
            created_at: self.created_at,
            modified_at: self.modified_at,
        })
    }
}

/// Struct for inserts - omits datetime fields to use SurrealDB defaults.
#[derive(Debug, Clone, Serialize)]
struct RecordCreate {
    hole_id: String,
    top_length: Length,
    bottom_length: Length,
    total_length: Length,
    box_id: u32,
    core_size: CoreSize,
}

impl From<&NewRecord> for RecordCreate {
    fn from(record: &NewRecord) -> Self {
        Self {
            hole_id: record.hole_id.clone(),
            top_length: record.top_length,
            bottom_length: record.bottom_length,
            total_length: record.total_length,
            box_id: record.box_id,
            core_size: record.core_size,
        }
    }
}

fn collect(rows: Vec<RecordRow>) -> Result<Vec<AssignmentRecord>, DbError> {
    rows.into_iter().map(RecordRow::into_record).collect()
}

fn is_unique_violation(err: &surrealdb::Error) -> bool {
    err.to_string().contains("already contains")
}

impl RecordRepository {
    /// Wrap an open connection.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new record; the store assigns its id and timestamps.
    pub async fn insert(&self, record: &NewRecord) -> Result<AssignmentRecord, DbError> {
        let id = RecordId::new();

        let created: Option<RecordRow> = self
            .db
            .create((TABLE, id.to_string()))
            .content(RecordCreate::from(record))
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::Duplicate(record.key().to_string())
                } else {
                    DbError::Connection(e)
                }
            })?;

        let created = created
            .ok_or_else(|| DbError::Query("Failed to create record".into()))?
            .into_record()?;

        tracing::debug!("Inserted record {} for {}", created.id, created.key());
        Ok(created)
    }

    /// Get a record by ID.
    pub async fn get(&self, id: RecordId) -> Result<AssignmentRecord, DbError> {
        let row: Option<RecordRow> = self.db.select((TABLE, id.to_string())).await?;

        row.ok_or_else(|| DbError::NotFound(format!("Record not found: {}", id)))?
            .into_record()
    }

    /// Check whether a record with the assignment tuple exists.
    pub async fn exists(&self, key: &DuplicateKey) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query(
                r#"
                SELECT count() FROM core_box
                WHERE hole_id = $hole_id
                    AND top_length = $top_length
                    AND bottom_length = $bottom_length
                    AND box_id = $box_id
                GROUP ALL
                "#,
            )
            .bind(("hole_id", key.hole_id.clone()))
            .bind(("top_length", key.top_length.hundredths()))
            .bind(("bottom_length", key.bottom_length.hundredths()))
            .bind(("box_id", key.box_id))
            .await?;

        #[derive(Deserialize)]
        struct CountResult {
            count: i64,
        }

        let counts: Vec<CountResult> = result.take(0)?;

        Ok(counts.first().is_some_and(|c| c.count > 0))
    }

    /// Delete every record of a hole starting at `top_length`.
    ///
    /// Returns the number of records removed.
    pub async fn delete(&self, hole_id: &str, top_length: Length) -> Result<usize, DbError> {
        let mut result = self
            .db
            .query(
                "DELETE core_box WHERE hole_id = $hole_id AND top_length = $top_length RETURN BEFORE",
            )
            .bind(("hole_id", hole_id.to_string()))
            .bind(("top_length", top_length.hundredths()))
            .await?;

        let removed: Vec<RecordRow> = result.take(0)?;
        tracing::debug!(
            "Deleted {} record(s) for {} at {}",
            removed.len(),
            hole_id,
            top_length
        );

        Ok(removed.len())
    }

    /// Delete a single record by ID.
    pub async fn delete_by_id(&self, id: RecordId) -> Result<(), DbError> {
        let removed: Option<RecordRow> = self.db.delete((TABLE, id.to_string())).await?;

        removed
            .map(|_| ())
            .ok_or_else(|| DbError::NotFound(format!("Record not found: {}", id)))
    }

    /// List records for one hole or for all holes, oldest first.
    pub async fn list(&self, filter: &HoleFilter) -> Result<Vec<AssignmentRecord>, DbError> {
        let rows: Vec<RecordRow> = match filter {
            HoleFilter::All => {
                let mut result = self
                    .db
                    .query("SELECT * FROM core_box ORDER BY created_at ASC, id ASC")
                    .await?;
                result.take(0)?
            }
            HoleFilter::Hole(hole_id) => {
                let mut result = self
                    .db
                    .query(
                        "SELECT * FROM core_box WHERE hole_id = $hole_id ORDER BY created_at ASC, id ASC",
                    )
                    .bind(("hole_id", hole_id.clone()))
                    .await?;
                result.take(0)?
            }
        };

        collect(rows)
    }

    /// Distinct hole IDs, sorted.
    pub async fn hole_ids(&self) -> Result<Vec<String>, DbError> {
        let mut result = self
            .db
            .query("SELECT hole_id FROM core_box GROUP BY hole_id ORDER BY hole_id ASC")
            .await?;

        #[derive(Deserialize)]
        struct HoleRow {
            hole_id: String,
        }

        let rows: Vec<HoleRow> = result.take(0)?;

        Ok(rows.into_iter().map(|r| r.hole_id).collect())
    }
}
