//! Headline numbers computed from the client cache. These use the same
//! formulas as `GET /stats` but are derived independently, so the two can
//! drift while the cache is stale.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Appeal, AppealStatus, Claim, ClaimStatus};
use crate::stats::success_rate;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_denied: f64,
    /// Recovered amounts of approved appeals only.
    pub total_recovered: f64,
    pub success_rate: u32,
    /// Appeals still waiting on the payer (pending or in review).
    pub pending_count: usize,
}

pub fn summarize(claims: &[Claim], appeals: &[Appeal]) -> DashboardSummary {
    let breakdown = AppealBreakdown::from_appeals(appeals);
    DashboardSummary {
        total_denied: claims.iter().map(|c| c.amount).sum(),
        total_recovered: breakdown.total_recovered,
        success_rate: success_rate(breakdown.approved as i64, breakdown.denied as i64),
        pending_count: breakdown.pending + breakdown.in_review,
    }
}

/// Per-status counts for the appeals tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppealBreakdown {
    pub total: usize,
    pub pending: usize,
    pub in_review: usize,
    pub approved: usize,
    pub denied: usize,
    pub total_recovered: f64,
    /// Mean recovery per approved appeal, rounded to whole dollars.
    pub average_recovery: f64,
}

impl AppealBreakdown {
    pub fn from_appeals(appeals: &[Appeal]) -> Self {
        let mut out = Self {
            total: appeals.len(),
            ..Default::default()
        };
        for appeal in appeals {
            match appeal.status {
                AppealStatus::Pending => out.pending += 1,
                AppealStatus::InReview => out.in_review += 1,
                AppealStatus::Approved => {
                    out.approved += 1;
                    out.total_recovered += appeal.recovered_amount.unwrap_or(0.0);
                }
                AppealStatus::Denied => out.denied += 1,
            }
        }
        if out.approved > 0 {
            out.average_recovery = (out.total_recovered / out.approved as f64).round();
        }
        out
    }
}

/// Days from `today` to the claim's appeal deadline. Negative once passed.
pub fn days_until_deadline(claim: &Claim, today: NaiveDate) -> i64 {
    (claim.deadline - today).num_days()
}

/// Unappealed claims whose deadline falls in the next `within_days` days
/// (today included), soonest first. Claims already past their deadline are
/// left out.
pub fn urgent_claims<'a>(claims: &'a [Claim], today: NaiveDate, within_days: i64) -> Vec<&'a Claim> {
    let mut urgent: Vec<&Claim> = claims
        .iter()
        .filter(|c| c.status != ClaimStatus::Appealed)
        .filter(|c| (0..=within_days).contains(&days_until_deadline(c, today)))
        .collect();
    urgent.sort_by_key(|c| c.deadline);
    urgent
}
