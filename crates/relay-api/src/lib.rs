//! API server for Relay.
//!
//! Exposes the GitLab webhook endpoint, delayed-task status queries and
//! job-group administration.

pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;
