//! Client-side cache of the three collections and the reducer that
//! replaces them. State only changes by feeding an action to `reduce`.

use chrono::NaiveDate;

use crate::dashboard::filters::{filter_appeals, filter_claims, AppealFilter, ClaimFilter};
use crate::dashboard::summary::{self, AppealBreakdown, DashboardSummary};
use crate::models::{Appeal, Claim, Payer, UserProfile};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStore {
    pub user: Option<UserProfile>,
    pub claims: Vec<Claim>,
    pub appeals: Vec<Appeal>,
    pub payers: Vec<Payer>,
    /// Set once the first full load has landed.
    pub loaded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardAction {
    SignedIn(UserProfile),
    Loaded {
        claims: Vec<Claim>,
        appeals: Vec<Appeal>,
        payers: Vec<Payer>,
    },
    ClaimsRefreshed(Vec<Claim>),
    AppealsRefreshed(Vec<Appeal>),
    SignedOut,
}

pub fn reduce(store: DashboardStore, action: DashboardAction) -> DashboardStore {
    match action {
        DashboardAction::SignedIn(user) => DashboardStore {
            user: Some(user),
            ..store
        },
        DashboardAction::Loaded {
            claims,
            appeals,
            payers,
        } => DashboardStore {
            claims,
            appeals,
            payers,
            loaded: true,
            ..store
        },
        DashboardAction::ClaimsRefreshed(claims) => DashboardStore { claims, ..store },
        DashboardAction::AppealsRefreshed(appeals) => DashboardStore { appeals, ..store },
        DashboardAction::SignedOut => DashboardStore::default(),
    }
}

impl DashboardStore {
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn claim(&self, id: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.id == id)
    }

    pub fn filtered_claims(&self, filter: &ClaimFilter) -> Vec<&Claim> {
        filter_claims(&self.claims, filter)
    }

    pub fn filtered_appeals(&self, filter: AppealFilter) -> Vec<&Appeal> {
        filter_appeals(&self.appeals, filter)
    }

    pub fn summary(&self) -> DashboardSummary {
        summary::summarize(&self.claims, &self.appeals)
    }

    pub fn appeal_breakdown(&self) -> AppealBreakdown {
        AppealBreakdown::from_appeals(&self.appeals)
    }

    pub fn urgent_claims(&self, today: NaiveDate, within_days: i64) -> Vec<&Claim> {
        summary::urgent_claims(&self.claims, today, within_days)
    }

    /// Payer names for the payer filter, in listing order.
    pub fn payer_names(&self) -> Vec<&str> {
        self.payers.iter().map(|p| p.name.as_str()).collect()
    }
}
