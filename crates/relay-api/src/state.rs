//! Application state.

use std::sync::Arc;

use relay_client::{JenkinsClient, JenkinsConfig};
use relay_db::{PgDelayedTaskStore, PgJobRegistry};
use relay_orchestrator::PushOrchestrator;
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub store: Arc<PgDelayedTaskStore>,
    pub registry: Arc<PgJobRegistry>,
    pub orchestrator: Arc<PushOrchestrator>,
    /// Shared secret for the webhook gate; `None` disables the check.
    pub webhook_token: Option<String>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        jenkins: JenkinsConfig,
        max_attempts: i32,
        webhook_token: Option<String>,
    ) -> Self {
        let store = Arc::new(PgDelayedTaskStore::new(pool.clone()));
        let registry = Arc::new(PgJobRegistry::new(pool.clone()));
        let client = Arc::new(JenkinsClient::new(jenkins));

        let orchestrator = Arc::new(PushOrchestrator::new(
            Arc::clone(&registry) as Arc<dyn relay_db::JobRegistry>,
            client,
            Arc::clone(&store) as Arc<dyn relay_db::DelayedTaskStore>,
            max_attempts,
        ));

        Self {
            pool,
            store,
            registry,
            orchestrator,
            webhook_token,
        }
    }
}
