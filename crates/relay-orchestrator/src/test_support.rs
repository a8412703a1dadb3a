//! Hand-rolled fakes for the collaborator seams, shared by the probe and
//! orchestrator tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use relay_core::{BuildClient, BuildRequest, ClientError, JobChain, TaskStatus};
use relay_db::{
    DbError, DbResult, DelayedTaskRecord, DelayedTaskStore, JobGroupRecord, JobRegistry,
};

fn key(base_path: &str, job_name: &str, branch: &str) -> String {
    format!("{}/{}/{}", base_path, job_name, branch)
}

pub struct FakeRegistry {
    chains: HashMap<String, JobChain>,
}

impl FakeRegistry {
    pub fn empty() -> Self {
        Self {
            chains: HashMap::new(),
        }
    }

    pub fn with_chain(group: &str, base_path: &str, jobs: &[&str]) -> Self {
        let mut chains = HashMap::new();
        chains.insert(
            group.to_string(),
            JobChain {
                jobs_base_path: base_path.to_string(),
                job_names: jobs.iter().map(|j| j.to_string()).collect(),
            },
        );
        Self { chains }
    }
}

#[async_trait]
impl JobRegistry for FakeRegistry {
    async fn lookup_chain(&self, group: &str) -> DbResult<JobChain> {
        self.chains
            .get(group)
            .cloned()
            .ok_or_else(|| DbError::NotFound(format!("job group {}", group)))
    }

    async fn create_group(
        &self,
        _name: &str,
        _jobs_base_path: &str,
        _job_names: &[String],
    ) -> DbResult<JobGroupRecord> {
        unimplemented!()
    }

    async fn list_groups(&self) -> DbResult<Vec<JobGroupRecord>> {
        unimplemented!()
    }

    async fn delete_group(&self, _name: &str) -> DbResult<()> {
        unimplemented!()
    }
}

#[derive(Default)]
pub struct FakeBuildClient {
    existing: Mutex<HashSet<String>>,
    connector_down: AtomicBool,
    response_error: AtomicBool,
    fail_trigger: AtomicBool,
    exist_checks: Mutex<Vec<String>>,
    triggers: Mutex<Vec<String>>,
}

impl FakeBuildClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provision(&self, base_path: &str, job_name: &str, branch: &str) {
        self.existing
            .lock()
            .unwrap()
            .insert(key(base_path, job_name, branch));
    }

    pub fn set_connector_down(&self, down: bool) {
        self.connector_down.store(down, Ordering::SeqCst);
    }

    pub fn set_response_error(&self, on: bool) {
        self.response_error.store(on, Ordering::SeqCst);
    }

    pub fn set_fail_trigger(&self, on: bool) {
        self.fail_trigger.store(on, Ordering::SeqCst);
    }

    pub fn exist_checks(&self) -> Vec<String> {
        self.exist_checks.lock().unwrap().clone()
    }

    pub fn triggers(&self) -> Vec<String> {
        self.triggers.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildClient for FakeBuildClient {
    async fn job_exists(
        &self,
        base_path: &str,
        job_name: &str,
        branch: &str,
    ) -> Result<bool, ClientError> {
        let key = key(base_path, job_name, branch);
        self.exist_checks.lock().unwrap().push(key.clone());

        if self.connector_down.load(Ordering::SeqCst) {
            return Err(ClientError::Connector("connection refused".to_string()));
        }
        if self.response_error.load(Ordering::SeqCst) {
            return Err(ClientError::Response {
                status: 403,
                message: "forbidden".to_string(),
            });
        }
        Ok(self.existing.lock().unwrap().contains(&key))
    }

    async fn trigger_build(
        &self,
        base_path: &str,
        job_name: &str,
        branch: &str,
    ) -> Result<(), ClientError> {
        self.triggers
            .lock()
            .unwrap()
            .push(key(base_path, job_name, branch));

        if self.fail_trigger.load(Ordering::SeqCst) {
            return Err(ClientError::Response {
                status: 500,
                message: "server error".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<String, DelayedTaskRecord>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(&self, fingerprint: &str) -> Option<DelayedTaskRecord> {
        self.tasks.lock().unwrap().get(fingerprint).cloned()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

#[async_trait]
impl DelayedTaskStore for InMemoryTaskStore {
    async fn get_or_create(
        &self,
        request: &BuildRequest,
    ) -> DbResult<(DelayedTaskRecord, bool)> {
        let mut tasks = self.tasks.lock().unwrap();
        let fingerprint = request.fingerprint();

        if let Some(existing) = tasks.get(&fingerprint) {
            return Ok((existing.clone(), false));
        }

        let now = Utc::now();
        let record = DelayedTaskRecord {
            id: uuid::Uuid::new_v4(),
            fingerprint: fingerprint.clone(),
            group_name: request.group.clone(),
            job_name: request.job_name.clone(),
            commit_sha: request.commit_sha.clone(),
            branch: request.branch.clone(),
            status: TaskStatus::Pending.to_string(),
            attempt_count: 0,
            created_at: now,
            updated_at: now,
        };
        tasks.insert(fingerprint, record.clone());
        Ok((record, true))
    }

    async fn get_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> DbResult<Option<DelayedTaskRecord>> {
        Ok(self.tasks.lock().unwrap().get(fingerprint).cloned())
    }

    async fn increment_attempts(&self, id: uuid::Uuid) -> DbResult<DelayedTaskRecord> {
        let mut tasks = self.tasks.lock().unwrap();
        let record = tasks
            .values_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| DbError::NotFound(format!("delayed task {}", id)))?;
        record.attempt_count += 1;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn set_status_success(&self, id: uuid::Uuid) -> DbResult<()> {
        self.set_status(id, TaskStatus::Success)
    }

    async fn set_status_canceled(&self, id: uuid::Uuid) -> DbResult<()> {
        self.set_status(id, TaskStatus::Canceled)
    }

    async fn list_pending(&self, limit: i64) -> DbResult<Vec<DelayedTaskRecord>> {
        let tasks = self.tasks.lock().unwrap();
        let mut pending: Vec<_> = tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending.as_str())
            .cloned()
            .collect();
        pending.sort_by_key(|t| t.created_at);
        pending.truncate(limit as usize);
        Ok(pending)
    }

    async fn list_recent(
        &self,
        _status: Option<TaskStatus>,
        _limit: i64,
    ) -> DbResult<Vec<DelayedTaskRecord>> {
        unimplemented!()
    }
}

impl InMemoryTaskStore {
    fn set_status(&self, id: uuid::Uuid, status: TaskStatus) -> DbResult<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let record = tasks
            .values_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| DbError::NotFound(format!("delayed task {}", id)))?;

        if record.status == TaskStatus::Pending.as_str() || record.status == status.as_str() {
            record.status = status.to_string();
            record.updated_at = Utc::now();
        }
        Ok(())
    }
}
