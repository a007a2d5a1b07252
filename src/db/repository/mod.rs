//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `Connection`, one sub-module per table.
//! Multi-statement writes open their own transaction.

mod appeal;
mod claim;
mod payer;
mod sequence;
mod stats;
mod user;

use chrono::NaiveDate;

use super::DatabaseError;

pub use appeal::*;
pub use claim::*;
pub use payer::*;
pub use sequence::*;
pub use stats::*;
pub use user::*;

pub(crate) fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        DatabaseError::ConstraintViolation(format!("{field} is not a date ({raw}): {e}"))
    })
}

pub(crate) fn parse_optional_date(
    field: &str,
    raw: Option<String>,
) -> Result<Option<NaiveDate>, DatabaseError> {
    raw.map(|s| parse_date(field, &s)).transpose()
}
