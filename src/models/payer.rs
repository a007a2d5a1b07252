use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payer {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub appeals_address: Option<String>,
    pub website: Option<String>,
    pub avg_response_days: Option<i64>,
    pub committed_response_days: Option<i64>,
}

/// Payer contact channels joined onto a claim by payer name. Flattened
/// into the claim on the wire as `payerPhone`, `payerEmail`, and so on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayerContact {
    #[serde(rename = "payerPhone", default)]
    pub phone: Option<String>,
    #[serde(rename = "payerEmail", default)]
    pub email: Option<String>,
    #[serde(rename = "payerFax", default)]
    pub fax: Option<String>,
    #[serde(rename = "payerAppealsAddress", default)]
    pub appeals_address: Option<String>,
    #[serde(rename = "payerAvgResponseDays", default)]
    pub avg_response_days: Option<i64>,
    #[serde(rename = "payerCommittedResponseDays", default)]
    pub committed_response_days: Option<i64>,
}

impl PayerContact {
    /// True when the claim's payer matched no payer row.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
