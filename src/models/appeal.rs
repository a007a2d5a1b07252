use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::AppealStatus;

/// A formal challenge to a claim denial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appeal {
    pub id: String,
    pub claim_id: String,
    pub patient: String,
    pub amount: f64,
    pub payer: String,
    pub submitted_date: NaiveDate,
    pub status: AppealStatus,
    pub recovered_amount: Option<f64>,
    pub decided_date: Option<NaiveDate>,
    pub days_to_decision: Option<i64>,
}

impl Appeal {
    /// Whole days between submission and decision, if decided.
    pub fn compute_days_to_decision(
        submitted: NaiveDate,
        decided: Option<NaiveDate>,
    ) -> Option<i64> {
        decided.map(|d| (d - submitted).num_days())
    }
}

/// Denormalized fields for a new appeal. Missing fields are copied
/// from the parent claim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAppeal {
    pub claim_id: String,
    pub patient: Option<String>,
    pub amount: Option<f64>,
    pub payer: Option<String>,
}

/// Status change for an appeal. Decided date is derived from the status.
#[derive(Debug, Clone, PartialEq)]
pub struct AppealUpdate {
    pub status: AppealStatus,
    pub recovered_amount: Option<f64>,
}
