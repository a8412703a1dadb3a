//! Repository traits and implementations.

pub mod delayed_task;
pub mod registry;

pub use delayed_task::{DelayedTaskRecord, DelayedTaskStore, PgDelayedTaskStore};
pub use registry::{JobGroupRecord, JobRegistry, PgJobRegistry};
