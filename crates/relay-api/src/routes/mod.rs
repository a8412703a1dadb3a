//! API routes.

pub mod groups;
pub mod health;
pub mod tasks;
pub mod webhooks;

use axum::Router;

use crate::AppState;

/// Build the main API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_router())
        .nest("/webhooks", webhooks::router())
        .merge(health::router())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/tasks", tasks::router())
        .nest("/groups", groups::router())
}
