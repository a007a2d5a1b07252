//! Filter predicates over the cached collections.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::db::DatabaseError;
use crate::models::{Appeal, AppealStatus, Claim, ClaimStatus};

/// Claim list filter. Every `None` field matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimFilter {
    /// Case-insensitive substring of the claim id or patient name.
    pub search: Option<String>,
    pub payer: Option<String>,
    pub status: Option<ClaimStatus>,
    /// Inclusive lower bound on the denied date.
    pub denied_from: Option<NaiveDate>,
    /// Inclusive upper bound on the denied date.
    pub denied_to: Option<NaiveDate>,
}

impl ClaimFilter {
    pub fn matches(&self, claim: &Claim) -> bool {
        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            if !claim.id.to_lowercase().contains(&needle)
                && !claim.patient.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if self.payer.as_deref().is_some_and(|p| p != claim.payer) {
            return false;
        }
        if self.status.is_some_and(|s| s != claim.status) {
            return false;
        }
        if self.denied_from.is_some_and(|from| claim.denied_date < from) {
            return false;
        }
        if self.denied_to.is_some_and(|to| claim.denied_date > to) {
            return false;
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Claims matching `filter`, in cache order.
pub fn filter_claims<'a>(claims: &'a [Claim], filter: &ClaimFilter) -> Vec<&'a Claim> {
    claims.iter().filter(|c| filter.matches(c)).collect()
}

/// The appeals tab filter: everything, or one status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppealFilter {
    #[default]
    All,
    Status(AppealStatus),
}

impl AppealFilter {
    pub fn matches(&self, appeal: &Appeal) -> bool {
        match self {
            Self::All => true,
            Self::Status(status) => appeal.status == *status,
        }
    }
}

impl FromStr for AppealFilter {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            other => other.parse().map(Self::Status),
        }
    }
}

/// Appeals matching `filter`, in cache order.
pub fn filter_appeals<'a>(appeals: &'a [Appeal], filter: AppealFilter) -> Vec<&'a Appeal> {
    appeals.iter().filter(|a| filter.matches(a)).collect()
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn sample() -> Vec<Claim> {
        vec![
            claim("CLM-001", "John Smith", "Aetna", ClaimStatus::Pending, "2025-01-05"),
            claim("CLM-002", "Mary Jones", "Cigna", ClaimStatus::Pending, "2025-01-10"),
            claim("CLM-003", "Ana Lee", "Aetna", ClaimStatus::Appealed, "2025-01-12"),
            claim("CLM-004", "Raj Patel", "Aetna", ClaimStatus::Pending, "2025-02-01"),
            claim("CLM-005", "Joan Smithers", "Humana", ClaimStatus::Urgent, "2025-02-03"),
        ]
    }

    fn ids(claims: &[&Claim]) -> Vec<String> {
        claims.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn payer_and_status_select_exact_subset_in_order() {
        let claims = sample();
        let filter = ClaimFilter {
            payer: Some("Aetna".into()),
            status: Some(ClaimStatus::Pending),
            ..Default::default()
        };
        assert_eq!(ids(&filter_claims(&claims, &filter)), vec!["CLM-001", "CLM-004"]);
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let claims = sample();
        let filter = ClaimFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter_claims(&claims, &filter).len(), claims.len());
    }

    #[test]
    fn search_matches_id_or_patient_ignoring_case() {
        let claims = sample();
        let by_name = ClaimFilter {
            search: Some("SMITH".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_claims(&claims, &by_name)), vec!["CLM-001", "CLM-005"]);

        let by_id = ClaimFilter {
            search: Some("clm-00".into()),
            ..Default::default()
        };
        assert_eq!(filter_claims(&claims, &by_id).len(), 5);

        let blank = ClaimFilter {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(filter_claims(&claims, &blank).len(), 5);
    }

    #[test]
    fn denied_range_is_inclusive() {
        let claims = sample();
        let filter = ClaimFilter {
            denied_from: Some(date("2025-01-10")),
            denied_to: Some(date("2025-02-01")),
            ..Default::default()
        };
        assert_eq!(
            ids(&filter_claims(&claims, &filter)),
            vec!["CLM-002", "CLM-003", "CLM-004"]
        );
    }

    #[test]
    fn payer_match_is_exact() {
        let claims = sample();
        let filter = ClaimFilter {
            payer: Some("aetna".into()),
            ..Default::default()
        };
        assert!(filter_claims(&claims, &filter).is_empty());
    }

    #[test]
    fn appeal_filter_by_status() {
        let appeals = vec![
            appeal("APL-001", AppealStatus::Pending, None),
            appeal("APL-002", AppealStatus::Approved, Some(800.0)),
            appeal("APL-003", AppealStatus::Pending, None),
        ];
        let pending = filter_appeals(&appeals, AppealFilter::Status(AppealStatus::Pending));
        let pending_ids: Vec<&str> = pending.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(pending_ids, vec!["APL-001", "APL-003"]);
        assert_eq!(filter_appeals(&appeals, AppealFilter::All).len(), 3);
    }

    #[test]
    fn appeal_filter_parses_tab_names() {
        assert_eq!("all".parse::<AppealFilter>().unwrap(), AppealFilter::All);
        assert_eq!(
            "in-review".parse::<AppealFilter>().unwrap(),
            AppealFilter::Status(AppealStatus::InReview)
        );
        assert!("closed".parse::<AppealFilter>().is_err());
    }
}
