use rusqlite::{params, Connection};

use crate::db::DatabaseError;

pub const CLAIM_SEQUENCE: &str = "claim";
pub const APPEAL_SEQUENCE: &str = "appeal";

/// Take the next value from a named sequence.
///
/// Must run inside the caller's transaction so the increment and the
/// insert that consumes it commit (or roll back) together.
pub fn next_sequence_value(conn: &Connection, name: &str) -> Result<i64, DatabaseError> {
    conn.query_row(
        "UPDATE id_sequences SET next_value = next_value + 1
         WHERE name = ?1
         RETURNING next_value - 1",
        params![name],
        |row| row.get::<_, i64>(0),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "sequence".into(),
            id: name.into(),
        },
        other => DatabaseError::Sqlite(other),
    })
}

/// `CLM-001`, `APL-042`, `CLM-1234`.
pub fn format_business_id(prefix: &str, value: i64) -> String {
    format!("{prefix}-{value:03}")
}
