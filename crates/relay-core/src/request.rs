//! Build requests and their dedup fingerprint.

use serde::{Deserialize, Serialize};

use crate::push::PushEvent;

/// A unit of build work derived from a push.
///
/// Two requests are the same unit of work iff their fingerprints match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub group: String,
    pub job_name: String,
    pub commit_sha: String,
    pub branch: String,
}

impl BuildRequest {
    pub fn new(
        group: impl Into<String>,
        job_name: impl Into<String>,
        commit_sha: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            job_name: job_name.into(),
            commit_sha: commit_sha.into(),
            branch: branch.into(),
        }
    }

    pub fn from_push(group: &str, job_name: &str, event: &PushEvent) -> Self {
        Self::new(group, job_name, &event.commit_sha, &event.branch)
    }

    /// Deterministic dedup key over (group, job, commit, branch).
    ///
    /// Fields are joined with a separator that cannot appear in any of
    /// them, so distinct tuples never produce the same hash input.
    pub fn fingerprint(&self) -> String {
        let input = format!(
            "{}\n{}\n{}\n{}",
            self.group, self.job_name, self.commit_sha, self.branch
        );
        format!("{:x}", md5::compute(input.as_bytes()))
    }
}
