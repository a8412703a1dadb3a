//! Webhook endpoints for Git providers.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::AppState;
use crate::error::ApiError;
use relay_orchestrator::PushOutcome;

pub fn router() -> Router<AppState> {
    Router::new().route("/gitlab/{group}/{job}", post(gitlab_webhook))
}

/// Handle a GitLab push webhook for a job group.
async fn gitlab_webhook(
    State(state): State<AppState>,
    Path((group, job)): Path<(String, String)>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    // Shared-secret gate; pass/fail only.
    if let Some(expected) = &state.webhook_token {
        let provided = headers.get("X-Gitlab-Token").and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            warn!(group = %group, "Webhook token mismatch");
            return Err(ApiError::Unauthorized("invalid webhook token".to_string()));
        }
    }

    let event_type = headers
        .get("X-Gitlab-Event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    if event_type != "Push Hook" {
        info!(event = %event_type, "Ignoring non-push event");
        return Ok((StatusCode::OK, Json(json!({ "result": "ignored" }))));
    }

    info!(group = %group, job = %job, "Received GitLab push webhook");

    let outcome = state.orchestrator.handle_raw(&group, &job, &payload).await?;

    let body = match &outcome {
        PushOutcome::Dispatched { job_name } => {
            json!({ "result": "dispatched", "job": job_name })
        }
        PushOutcome::DispatchFailed => json!({ "result": "dispatch_failed" }),
        PushOutcome::Deferred { attempts } => {
            json!({ "result": "deferred", "attempts": attempts })
        }
        PushOutcome::Canceled { attempts } => {
            json!({ "result": "canceled", "attempts": attempts })
        }
        PushOutcome::AlreadyResolved(status) => {
            json!({ "result": "already_resolved", "status": status.to_string() })
        }
        PushOutcome::Dropped => json!({ "result": "dropped" }),
    };

    Ok((StatusCode::OK, Json(body)))
}
