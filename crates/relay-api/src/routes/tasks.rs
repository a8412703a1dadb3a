//! Delayed-task status endpoints.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use relay_core::TaskStatus;
use relay_db::{DelayedTaskRecord, DelayedTaskStore};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks))
        .route("/{fingerprint}", get(get_task))
}

#[derive(Debug, Deserialize)]
struct ListTasksQuery {
    status: Option<TaskStatus>,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct TaskResponse {
    id: String,
    fingerprint: String,
    group: String,
    job_name: String,
    commit_sha: String,
    branch: String,
    status: String,
    attempt_count: i32,
}

impl From<DelayedTaskRecord> for TaskResponse {
    fn from(record: DelayedTaskRecord) -> Self {
        Self {
            id: record.id.to_string(),
            fingerprint: record.fingerprint,
            group: record.group_name,
            job_name: record.job_name,
            commit_sha: record.commit_sha,
            branch: record.branch,
            status: record.status,
            attempt_count: record.attempt_count,
        }
    }
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = state
        .store
        .list_recent(query.status, query.limit.unwrap_or(50))
        .await?;
    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

async fn get_task(
    State(state): State<AppState>,
    Path(fingerprint): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state
        .store
        .get_by_fingerprint(&fingerprint)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("delayed task {}", fingerprint)))?;
    Ok(Json(task.into()))
}
