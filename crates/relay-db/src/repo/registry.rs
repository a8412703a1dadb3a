//! Job-group registry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_core::JobChain;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::{DbError, DbResult};

/// A job-group row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobGroupRecord {
    pub id: uuid::Uuid,
    pub name: String,
    pub jobs_base_path: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// Resolve the ordered job chain registered for a group.
    /// `NotFound` when the group is unknown.
    async fn lookup_chain(&self, group: &str) -> DbResult<JobChain>;

    async fn create_group(
        &self,
        name: &str,
        jobs_base_path: &str,
        job_names: &[String],
    ) -> DbResult<JobGroupRecord>;

    async fn list_groups(&self) -> DbResult<Vec<JobGroupRecord>>;

    async fn delete_group(&self, name: &str) -> DbResult<()>;
}

/// PostgreSQL implementation of [`JobRegistry`].
pub struct PgJobRegistry {
    pool: PgPool,
}

impl PgJobRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRegistry for PgJobRegistry {
    async fn lookup_chain(&self, group: &str) -> DbResult<JobChain> {
        let record =
            sqlx::query_as::<_, JobGroupRecord>("SELECT * FROM job_groups WHERE name = $1")
                .bind(group)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::NotFound(format!("job group {}", group)))?;

        let job_names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM jobs WHERE group_id = $1 ORDER BY position")
                .bind(record.id)
                .fetch_all(&self.pool)
                .await?;

        Ok(JobChain {
            jobs_base_path: record.jobs_base_path,
            job_names,
        })
    }

    async fn create_group(
        &self,
        name: &str,
        jobs_base_path: &str,
        job_names: &[String],
    ) -> DbResult<JobGroupRecord> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, JobGroupRecord>(
            r#"
            INSERT INTO job_groups (id, name, jobs_base_path, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING *
            "#,
        )
        .bind(uuid::Uuid::now_v7())
        .bind(name)
        .bind(jobs_base_path)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DbError::Duplicate(format!("job group {}", name))
            }
            _ => DbError::Database(e),
        })?;

        for (position, job_name) in job_names.iter().enumerate() {
            sqlx::query("INSERT INTO jobs (id, group_id, name, position) VALUES ($1, $2, $3, $4)")
                .bind(uuid::Uuid::now_v7())
                .bind(record.id)
                .bind(job_name)
                .bind(position as i32)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(record)
    }

    async fn list_groups(&self) -> DbResult<Vec<JobGroupRecord>> {
        let records =
            sqlx::query_as::<_, JobGroupRecord>("SELECT * FROM job_groups ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(records)
    }

    async fn delete_group(&self, name: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM job_groups WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("job group {}", name)));
        }
        Ok(())
    }
}
