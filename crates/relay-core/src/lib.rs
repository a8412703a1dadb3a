//! Core domain types and traits for the Relay push-to-build service.
//!
//! This crate contains:
//! - Push event normalization
//! - Build requests and their dedup fingerprint
//! - The delayed-task status type
//! - Job chain types and the build-client trait

pub mod chain;
pub mod client;
pub mod push;
pub mod request;
pub mod task;

pub use chain::JobChain;
pub use client::{BuildClient, ClientError};
pub use push::PushEvent;
pub use request::BuildRequest;
pub use task::TaskStatus;
