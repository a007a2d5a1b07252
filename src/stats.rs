//! Portfolio statistics for `GET /stats`.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::repository::{fetch_stats_inputs, StatsInputs};
use crate::db::DatabaseError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_denied: f64,
    pub total_recovered: f64,
    pub success_rate: u32,
    pub pending_appeals: i64,
    pub total_claims: i64,
    pub total_appeals: i64,
    pub approved_appeals: i64,
    pub denied_appeals: i64,
}

/// Percentage of decided appeals that were approved, rounded half up.
/// Zero when nothing has been decided.
pub fn success_rate(approved: i64, denied: i64) -> u32 {
    let decided = approved + denied;
    if decided <= 0 {
        return 0;
    }
    ((approved as f64 / decided as f64) * 100.0).round() as u32
}

impl From<StatsInputs> for Stats {
    fn from(inputs: StatsInputs) -> Self {
        Self {
            total_denied: inputs.total_denied,
            total_recovered: inputs.recovered,
            success_rate: success_rate(inputs.approved, inputs.denied),
            pending_appeals: inputs.open,
            total_claims: inputs.total_claims,
            total_appeals: inputs.total_appeals,
            approved_appeals: inputs.approved,
            denied_appeals: inputs.denied,
        }
    }
}

/// Recomputed from the tables on every call.
pub fn compute_stats(conn: &Connection) -> Result<Stats, DatabaseError> {
    Ok(Stats::from(fetch_stats_inputs(conn)?))
}
