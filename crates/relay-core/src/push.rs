//! Push event normalization.

use serde::{Deserialize, Serialize};

/// The sha GitLab reports for a deleted ref.
const ZERO_SHA: &str = "0000000000000000000000000000000000000000";

/// A normalized push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    pub commit_sha: String,
    pub branch: String,
}

impl PushEvent {
    /// Parse a GitLab push webhook payload.
    ///
    /// Returns `None` when the push is not a build trigger: a ref that is
    /// not a branch, a missing commit sha, or the all-zero sha of a branch
    /// deletion.
    pub fn from_gitlab_payload(payload: &serde_json::Value) -> Option<Self> {
        let r#ref = payload.get("ref")?.as_str()?;
        let branch = r#ref.strip_prefix("refs/heads/")?.to_string();
        if branch.is_empty() {
            return None;
        }

        let commit_sha = payload
            .get("checkout_sha")
            .and_then(|s| s.as_str())
            .or_else(|| payload.get("after").and_then(|s| s.as_str()))?
            .to_string();

        if commit_sha.is_empty() || commit_sha == ZERO_SHA {
            return None;
        }

        Some(PushEvent { commit_sha, branch })
    }
}
