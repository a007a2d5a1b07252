use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::ClaimStatus;
use super::payer::PayerContact;

/// A denied reimbursement request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: String,
    pub patient: String,
    pub amount: f64,
    pub payer: String,
    pub denial_reason: String,
    pub denied_date: NaiveDate,
    pub deadline: NaiveDate,
    pub status: ClaimStatus,
    #[serde(default)]
    pub patient_email: Option<String>,
    #[serde(default)]
    pub patient_phone: Option<String>,
    #[serde(default)]
    pub service_date: Option<NaiveDate>,
    #[serde(default)]
    pub service_code: Option<String>,
    #[serde(default)]
    pub diagnosis_code: Option<String>,
    /// Joined from the payer table by name.
    #[serde(flatten)]
    pub payer_contact: PayerContact,
}

/// Validated input for a new claim. Status always starts as pending.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClaim {
    pub patient: String,
    pub amount: f64,
    pub payer: String,
    pub denial_reason: String,
    pub denied_date: NaiveDate,
    pub deadline: NaiveDate,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub service_code: Option<String>,
    pub diagnosis_code: Option<String>,
}
