//! Delayed-task store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_core::{BuildRequest, TaskStatus};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::{DbError, DbResult};

/// A delayed-task row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DelayedTaskRecord {
    pub id: uuid::Uuid,
    pub fingerprint: String,
    pub group_name: String,
    pub job_name: String,
    pub commit_sha: String,
    pub branch: String,
    pub status: String,
    pub attempt_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DelayedTaskRecord {
    pub fn task_status(&self) -> Option<TaskStatus> {
        self.status.parse().ok()
    }

    pub fn is_terminal(&self) -> bool {
        self.task_status().is_some_and(|s| s.is_terminal())
    }

    /// Rebuild the request this task was created for (used by the sweep).
    pub fn to_request(&self) -> BuildRequest {
        BuildRequest::new(
            &self.group_name,
            &self.job_name,
            &self.commit_sha,
            &self.branch,
        )
    }
}

#[async_trait]
pub trait DelayedTaskStore: Send + Sync {
    /// Look up the task for a request's fingerprint, creating a Pending
    /// row with zero attempts when none exists. The bool reports whether
    /// a row was created. Safe under concurrent calls for the same
    /// fingerprint: the unique constraint decides the winner and the
    /// loser falls back to reading the winner's row.
    async fn get_or_create(&self, request: &BuildRequest)
    -> DbResult<(DelayedTaskRecord, bool)>;

    async fn get_by_fingerprint(&self, fingerprint: &str)
    -> DbResult<Option<DelayedTaskRecord>>;

    /// Atomically add 1 to the attempt count and return the updated row.
    /// `NotFound` when the row no longer exists.
    async fn increment_attempts(&self, id: uuid::Uuid) -> DbResult<DelayedTaskRecord>;

    /// Transition to Success. A no-op when the row is already terminal;
    /// `NotFound` when the row no longer exists.
    async fn set_status_success(&self, id: uuid::Uuid) -> DbResult<()>;

    /// Transition to Canceled. Same contract as [`set_status_success`].
    ///
    /// [`set_status_success`]: DelayedTaskStore::set_status_success
    async fn set_status_canceled(&self, id: uuid::Uuid) -> DbResult<()>;

    /// Pending tasks in creation order, for the retry sweep.
    async fn list_pending(&self, limit: i64) -> DbResult<Vec<DelayedTaskRecord>>;

    /// Most recent tasks, optionally filtered by status.
    async fn list_recent(
        &self,
        status: Option<TaskStatus>,
        limit: i64,
    ) -> DbResult<Vec<DelayedTaskRecord>>;
}

/// PostgreSQL implementation of [`DelayedTaskStore`].
pub struct PgDelayedTaskStore {
    pool: PgPool,
}

impl PgDelayedTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn set_status(&self, id: uuid::Uuid, status: TaskStatus) -> DbResult<()> {
        // Never overwrite the other terminal status; re-applying the same
        // one is an idempotent no-op.
        let result = sqlx::query(
            r#"
            UPDATE delayed_tasks SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', $2)
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM delayed_tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match exists {
            Some(_) => Ok(()),
            None => Err(DbError::NotFound(format!("delayed task {}", id))),
        }
    }
}

#[async_trait]
impl DelayedTaskStore for PgDelayedTaskStore {
    async fn get_or_create(
        &self,
        request: &BuildRequest,
    ) -> DbResult<(DelayedTaskRecord, bool)> {
        let fingerprint = request.fingerprint();

        let inserted = sqlx::query_as::<_, DelayedTaskRecord>(
            r#"
            INSERT INTO delayed_tasks
                (id, fingerprint, group_name, job_name, commit_sha, branch,
                 status, attempt_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', 0, NOW(), NOW())
            ON CONFLICT (fingerprint) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(uuid::Uuid::now_v7())
        .bind(&fingerprint)
        .bind(&request.group)
        .bind(&request.job_name)
        .bind(&request.commit_sha)
        .bind(&request.branch)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(record) = inserted {
            return Ok((record, true));
        }

        // Lost the insert race; read the winner's row.
        let existing = sqlx::query_as::<_, DelayedTaskRecord>(
            "SELECT * FROM delayed_tasks WHERE fingerprint = $1",
        )
        .bind(&fingerprint)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("delayed task {}", fingerprint)))?;

        Ok((existing, false))
    }

    async fn get_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> DbResult<Option<DelayedTaskRecord>> {
        let record = sqlx::query_as::<_, DelayedTaskRecord>(
            "SELECT * FROM delayed_tasks WHERE fingerprint = $1",
        )
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn increment_attempts(&self, id: uuid::Uuid) -> DbResult<DelayedTaskRecord> {
        let record = sqlx::query_as::<_, DelayedTaskRecord>(
            r#"
            UPDATE delayed_tasks
            SET attempt_count = attempt_count + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("delayed task {}", id)))?;
        Ok(record)
    }

    async fn set_status_success(&self, id: uuid::Uuid) -> DbResult<()> {
        self.set_status(id, TaskStatus::Success).await
    }

    async fn set_status_canceled(&self, id: uuid::Uuid) -> DbResult<()> {
        self.set_status(id, TaskStatus::Canceled).await
    }

    async fn list_pending(&self, limit: i64) -> DbResult<Vec<DelayedTaskRecord>> {
        let records = sqlx::query_as::<_, DelayedTaskRecord>(
            "SELECT * FROM delayed_tasks WHERE status = 'pending' ORDER BY created_at ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn list_recent(
        &self,
        status: Option<TaskStatus>,
        limit: i64,
    ) -> DbResult<Vec<DelayedTaskRecord>> {
        let records = match status {
            Some(status) => {
                sqlx::query_as::<_, DelayedTaskRecord>(
                    "SELECT * FROM delayed_tasks WHERE status = $1 ORDER BY created_at DESC LIMIT $2",
                )
                .bind(status.as_str())
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DelayedTaskRecord>(
                    "SELECT * FROM delayed_tasks ORDER BY created_at DESC LIMIT $1",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(records)
    }
}
