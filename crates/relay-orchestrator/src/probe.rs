//! Chain readiness probing.

use std::sync::Arc;

use tracing::{debug, error, warn};

use relay_core::{BuildClient, ClientError};
use relay_db::{DbError, JobRegistry};

/// Result of a readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Every job in the chain exists for the branch.
    Ready,
    /// At least one job is missing, or the group is not usably configured.
    NotReady,
    /// The build server could not be reached.
    TransientFailure,
}

/// Read-only check of whether a group's job chain is ready for a branch.
///
/// Walks the chain in order and stops at the first gap or failure; it
/// never mutates persisted state.
pub struct ReadinessProber {
    registry: Arc<dyn JobRegistry>,
    client: Arc<dyn BuildClient>,
}

impl ReadinessProber {
    pub fn new(registry: Arc<dyn JobRegistry>, client: Arc<dyn BuildClient>) -> Self {
        Self { registry, client }
    }

    pub async fn probe(&self, group: &str, branch: &str) -> Result<ProbeOutcome, DbError> {
        let chain = match self.registry.lookup_chain(group).await {
            Ok(chain) => chain,
            Err(e) if e.is_not_found() => {
                warn!(group, "Unknown job group, treating as not ready");
                return Ok(ProbeOutcome::NotReady);
            }
            Err(e) => return Err(e),
        };

        if chain.is_empty() {
            warn!(group, "Job group has no jobs registered, treating as not ready");
            return Ok(ProbeOutcome::NotReady);
        }

        for job_name in &chain.job_names {
            match self
                .client
                .job_exists(&chain.jobs_base_path, job_name, branch)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    debug!(group, job = %job_name, branch, "Job not provisioned yet");
                    return Ok(ProbeOutcome::NotReady);
                }
                Err(ClientError::Connector(message)) => {
                    error!(
                        group,
                        job = %job_name,
                        branch,
                        error = %message,
                        "Build server unreachable"
                    );
                    return Ok(ProbeOutcome::TransientFailure);
                }
                Err(e) => {
                    debug!(group, job = %job_name, branch, error = %e, "Existence probe rejected");
                    return Ok(ProbeOutcome::NotReady);
                }
            }
        }

        Ok(ProbeOutcome::Ready)
    }
}
