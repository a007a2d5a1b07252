//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Rate limiter on the unauthenticated auth routes
//! 2. Auth validator: bearer token → `UserContext`
//! 3. Audit logger: runs after auth, has the user id

pub mod audit;
pub mod auth;
pub mod rate;
