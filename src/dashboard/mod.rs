//! Dashboard state: a typed API client, the cached collections, and the
//! filtered and aggregated views derived from them.

pub mod client;
pub mod filters;
pub mod session;
pub mod store;
pub mod summary;

pub use client::{ApiClient, AppealDraft, ClaimDraft, ClientError};
pub use filters::{filter_appeals, filter_claims, AppealFilter, ClaimFilter};
pub use session::DashboardSession;
pub use store::{reduce, DashboardAction, DashboardStore};
pub use summary::{days_until_deadline, summarize, urgent_claims, AppealBreakdown, DashboardSummary};
