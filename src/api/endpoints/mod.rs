//! API endpoint handlers, one module per resource.

pub mod appeals;
pub mod auth;
pub mod claims;
pub mod health;
pub mod payers;
pub mod stats;
