//! Job chains.

use serde::{Deserialize, Serialize};

/// The ordered chain of build jobs registered for a group.
///
/// All jobs in the chain must exist on the build server for a branch
/// before the first one may be triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobChain {
    /// Folder on the build server under which the chain's jobs live.
    pub jobs_base_path: String,
    /// Job names in chain order.
    pub job_names: Vec<String>,
}

impl JobChain {
    pub fn first_job(&self) -> Option<&str> {
        self.job_names.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.job_names.is_empty()
    }
}
