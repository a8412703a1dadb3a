//! Periodic retry sweep over pending delayed tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use relay_db::DelayedTaskStore;

use crate::orchestrator::PushOrchestrator;

/// How many pending tasks one sweep picks up.
const SWEEP_BATCH_SIZE: i64 = 100;

/// Re-runs the probe cycle for pending delayed tasks on an interval.
pub struct Sweeper {
    store: Arc<dyn DelayedTaskStore>,
    orchestrator: Arc<PushOrchestrator>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(
        store: Arc<dyn DelayedTaskStore>,
        orchestrator: Arc<PushOrchestrator>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            orchestrator,
            interval,
        }
    }

    /// Run the sweep loop.
    pub async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting delayed-task sweeper"
        );

        loop {
            self.sweep_once().await;
            sleep(self.interval).await;
        }
    }

    /// One pass over the pending tasks.
    pub async fn sweep_once(&self) {
        let tasks = match self.store.list_pending(SWEEP_BATCH_SIZE).await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(error = %e, "Failed to list pending delayed tasks");
                return;
            }
        };

        for task in tasks {
            let request = task.to_request();
            match self.orchestrator.handle_request(&request).await {
                Ok(outcome) => {
                    debug!(fingerprint = %task.fingerprint, ?outcome, "Swept delayed task");
                }
                Err(e) => {
                    warn!(fingerprint = %task.fingerprint, error = %e, "Sweep cycle failed");
                }
            }
        }
    }
}
