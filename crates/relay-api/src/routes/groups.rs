//! Job-group registry endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use relay_db::JobRegistry;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route("/{name}", delete(delete_group))
}

#[derive(Debug, Deserialize)]
struct CreateGroupRequest {
    name: String,
    jobs_base_path: String,
    /// Job names in chain order.
    jobs: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GroupResponse {
    id: String,
    name: String,
    jobs_base_path: String,
}

async fn list_groups(
    State(state): State<AppState>,
) -> Result<Json<Vec<GroupResponse>>, ApiError> {
    let groups = state.registry.list_groups().await?;
    let response = groups
        .into_iter()
        .map(|g| GroupResponse {
            id: g.id.to_string(),
            name: g.name,
            jobs_base_path: g.jobs_base_path,
        })
        .collect();
    Ok(Json(response))
}

async fn create_group(
    State(state): State<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    if req.name.is_empty() {
        return Err(ApiError::BadRequest("group name must not be empty".to_string()));
    }

    let group = state
        .registry
        .create_group(&req.name, &req.jobs_base_path, &req.jobs)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GroupResponse {
            id: group.id.to_string(),
            name: group.name,
            jobs_base_path: group.jobs_base_path,
        }),
    ))
}

async fn delete_group(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.registry.delete_group(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
