//! Push-to-build orchestration for Relay.
//!
//! Decides, per push or retry sweep, whether to trigger the first job of
//! a group's chain or to track a retry-bounded delayed task.

pub mod orchestrator;
pub mod probe;
pub mod sweeper;

#[cfg(test)]
pub(crate) mod test_support;

pub use orchestrator::{OrchestratorError, PushOrchestrator, PushOutcome};
pub use probe::{ProbeOutcome, ReadinessProber};
pub use sweeper::Sweeper;
