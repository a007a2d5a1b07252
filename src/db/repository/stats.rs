use rusqlite::Connection;

use crate::db::DatabaseError;

/// Raw aggregates read in two statements. Turned into `Stats` by
/// `crate::stats::compute_stats`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsInputs {
    pub total_denied: f64,
    pub total_claims: i64,
    pub total_appeals: i64,
    pub approved: i64,
    pub denied: i64,
    pub open: i64,
    pub recovered: f64,
}

pub fn fetch_stats_inputs(conn: &Connection) -> Result<StatsInputs, DatabaseError> {
    let (total_denied, total_claims) = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0), COUNT(*) FROM claims",
        [],
        |row| Ok((row.get::<_, f64>(0)?, row.get::<_, i64>(1)?)),
    )?;

    let (total_appeals, approved, denied, open, recovered) = conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(status = 'approved'), 0),
                COALESCE(SUM(status = 'denied'), 0),
                COALESCE(SUM(status IN ('pending', 'in-review')), 0),
                COALESCE(SUM(CASE WHEN status = 'approved' THEN recovered_amount END), 0)
         FROM appeals",
        [],
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, f64>(4)?,
            ))
        },
    )?;

    Ok(StatsInputs {
        total_denied,
        total_claims,
        total_appeals,
        approved,
        denied,
        open,
        recovered,
    })
}
