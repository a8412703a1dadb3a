//! Push-to-build decision flow.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use relay_core::{BuildClient, BuildRequest, PushEvent, TaskStatus};
use relay_db::{DbError, DelayedTaskStore, JobRegistry};

use crate::probe::{ProbeOutcome, ReadinessProber};

/// Errors surfaced to the caller of a push cycle. Benign races
/// (record-not-found during bookkeeping) are swallowed internally; what
/// reaches the caller is a real persistence problem.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("store error: {0}")]
    Store(#[from] DbError),
}

/// What a handled push cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The chain was ready and its first job was triggered.
    Dispatched { job_name: String },
    /// The chain was ready but the trigger call failed. Logged only; any
    /// pending task stays Pending and the next sweep retries the cycle.
    DispatchFailed,
    /// The chain is not ready; a delayed task is tracking retries.
    Deferred { attempts: i32 },
    /// The retry budget is exhausted; the task is terminally canceled.
    Canceled { attempts: i32 },
    /// A terminal task already exists for this fingerprint.
    AlreadyResolved(TaskStatus),
    /// The raw payload was not a build trigger.
    Dropped,
}

/// Orchestrates one probe cycle per push or sweep invocation: probe the
/// chain, then either dispatch its first job or advance the fingerprint's
/// delayed task.
pub struct PushOrchestrator {
    registry: Arc<dyn JobRegistry>,
    client: Arc<dyn BuildClient>,
    store: Arc<dyn DelayedTaskStore>,
    prober: ReadinessProber,
    max_attempts: i32,
}

impl PushOrchestrator {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        client: Arc<dyn BuildClient>,
        store: Arc<dyn DelayedTaskStore>,
        max_attempts: i32,
    ) -> Self {
        let prober = ReadinessProber::new(Arc::clone(&registry), Arc::clone(&client));
        Self {
            registry,
            client,
            store,
            prober,
            max_attempts,
        }
    }

    /// Handle a raw GitLab push payload for a group.
    pub async fn handle_raw(
        &self,
        group: &str,
        job_name: &str,
        payload: &serde_json::Value,
    ) -> Result<PushOutcome, OrchestratorError> {
        let Some(event) = PushEvent::from_gitlab_payload(payload) else {
            info!(group, "Skipping push with no buildable commit");
            return Ok(PushOutcome::Dropped);
        };
        self.handle_push(group, job_name, &event).await
    }

    pub async fn handle_push(
        &self,
        group: &str,
        job_name: &str,
        event: &PushEvent,
    ) -> Result<PushOutcome, OrchestratorError> {
        let request = BuildRequest::from_push(group, job_name, event);
        self.handle_request(&request).await
    }

    /// One probe cycle for a request, whether it came from a fresh push
    /// or from the retry sweep.
    pub async fn handle_request(
        &self,
        request: &BuildRequest,
    ) -> Result<PushOutcome, OrchestratorError> {
        let fingerprint = request.fingerprint();

        // A terminal task is never re-dispatched or re-activated.
        if let Some(existing) = self.store.get_by_fingerprint(&fingerprint).await? {
            if let Some(status) = existing.task_status().filter(TaskStatus::is_terminal) {
                debug!(fingerprint = %fingerprint, status = %status, "Task already resolved");
                return Ok(PushOutcome::AlreadyResolved(status));
            }
        }

        match self.prober.probe(&request.group, &request.branch).await? {
            ProbeOutcome::Ready => Ok(self.dispatch(request, &fingerprint).await),
            ProbeOutcome::NotReady | ProbeOutcome::TransientFailure => {
                self.defer(request, &fingerprint).await
            }
        }
    }

    async fn dispatch(&self, request: &BuildRequest, fingerprint: &str) -> PushOutcome {
        match self.trigger_first_job(request).await {
            Ok(job_name) => {
                info!(
                    group = %request.group,
                    branch = %request.branch,
                    job = %job_name,
                    "Triggered first job in chain"
                );
                self.mark_dispatched(fingerprint).await;
                PushOutcome::Dispatched { job_name }
            }
            Err(e) => {
                error!(
                    group = %request.group,
                    branch = %request.branch,
                    error = %e,
                    "Dispatch failed"
                );
                PushOutcome::DispatchFailed
            }
        }
    }

    async fn trigger_first_job(&self, request: &BuildRequest) -> Result<String, String> {
        let chain = self
            .registry
            .lookup_chain(&request.group)
            .await
            .map_err(|e| format!("chain lookup failed: {}", e))?;

        let job_name = chain
            .first_job()
            .ok_or_else(|| format!("job group {} has no jobs", request.group))?
            .to_string();

        self.client
            .trigger_build(&chain.jobs_base_path, &job_name, &request.branch)
            .await
            .map_err(|e| format!("trigger failed: {}", e))?;

        Ok(job_name)
    }

    /// Best-effort bookkeeping after a successful trigger. A missing task
    /// is first-time success, and store errors here are logged rather
    /// than propagated so the already-issued trigger is never repeated.
    async fn mark_dispatched(&self, fingerprint: &str) {
        let task = match self.store.get_by_fingerprint(fingerprint).await {
            Ok(Some(task)) => task,
            Ok(None) => return,
            Err(e) => {
                error!(fingerprint, error = %e, "Could not look up delayed task after dispatch");
                return;
            }
        };

        if let Err(e) = self.store.set_status_success(task.id).await {
            if !e.is_not_found() {
                error!(task_id = %task.id, error = %e, "Could not mark delayed task successful");
            }
            return;
        }
        if let Err(e) = self.store.increment_attempts(task.id).await {
            if !e.is_not_found() {
                error!(task_id = %task.id, error = %e, "Could not record final attempt");
            }
        }
    }

    async fn defer(
        &self,
        request: &BuildRequest,
        fingerprint: &str,
    ) -> Result<PushOutcome, OrchestratorError> {
        let (task, created) = self.store.get_or_create(request).await?;
        if created {
            info!(
                fingerprint,
                group = %request.group,
                branch = %request.branch,
                "Created delayed task"
            );
        } else if let Some(status) = task.task_status().filter(TaskStatus::is_terminal) {
            // Resolved between the entry check and here.
            return Ok(PushOutcome::AlreadyResolved(status));
        }

        let task = match self.store.increment_attempts(task.id).await {
            Ok(task) => task,
            Err(e) if e.is_not_found() => {
                debug!(fingerprint, "Delayed task gone before attempt could be recorded");
                return Ok(PushOutcome::Deferred {
                    attempts: task.attempt_count,
                });
            }
            Err(e) => return Err(e.into()),
        };

        if task.attempt_count > self.max_attempts {
            match self.store.set_status_canceled(task.id).await {
                Ok(()) => {
                    warn!(
                        fingerprint,
                        attempts = task.attempt_count,
                        "Retry budget exhausted, canceling delayed task"
                    );
                    return Ok(PushOutcome::Canceled {
                        attempts: task.attempt_count,
                    });
                }
                Err(e) if e.is_not_found() => {
                    debug!(fingerprint, "Delayed task gone before it could be canceled");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(PushOutcome::Deferred {
            attempts: task.attempt_count,
        })
    }
}
