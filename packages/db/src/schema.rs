//! Database schema definitions using SurrealQL.

use crate::{Database, DbError};

/// Initialize the database schema.
///
/// This creates the record table, its fields and indexes.
pub async fn init_schema(db: &Database) -> Result<(), DbError> {
    tracing::info!("Initializing database schema...");

    db.query(CORE_BOX_SCHEMA).await?.check()?;

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Core box record table schema.
///
/// Lengths are integers in hundredths of a metre.
const CORE_BOX_SCHEMA: &str = r#"
-- One row per committed box assignment
DEFINE TABLE IF NOT EXISTS core_box SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS hole_id ON core_box TYPE string ASSERT string::len($value) > 0;
DEFINE FIELD IF NOT EXISTS top_length ON core_box TYPE int ASSERT $value >= 0;
DEFINE FIELD IF NOT EXISTS bottom_length ON core_box TYPE int ASSERT $value > 0;
DEFINE FIELD IF NOT EXISTS total_length ON core_box TYPE int;
DEFINE FIELD IF NOT EXISTS box_id ON core_box TYPE int ASSERT $value >= 0;
DEFINE FIELD IF NOT EXISTS core_size ON core_box TYPE string DEFAULT "half_core";
DEFINE FIELD IF NOT EXISTS created_at ON core_box TYPE datetime DEFAULT time::now();
DEFINE FIELD IF NOT EXISTS modified_at ON core_box TYPE datetime DEFAULT time::now();

-- No two records may share the assignment tuple
DEFINE INDEX IF NOT EXISTS core_box_assignment ON core_box FIELDS hole_id, top_length, bottom_length, box_id UNIQUE;

-- Hole filter and listing order
DEFINE INDEX IF NOT EXISTS core_box_hole ON core_box FIELDS hole_id;
DEFINE INDEX IF NOT EXISTS core_box_created ON core_box FIELDS created_at;
"#;
