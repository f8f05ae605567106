//! Health check endpoint handler

use axum::{extract::State, Json};

use crate::api::error::ApiResult;
use crate::api::models::HealthResponse;
use crate::api::routes::AppState;

/// Handler for GET /health
///
/// `total_threads` counts distinct threads started by this process;
/// `total_checkpoints` comes from the checkpoint store.
pub async fn health(State(app_state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let stats = app_state.saver.stats().await?;
    let thread_ids = app_state.registry.active_thread_ids().await;

    let mut health = HealthResponse::new(app_state.saver.backend());
    health.total_threads = app_state.registry.created_total().await;
    health.active_threads = thread_ids.len();
    health.thread_ids = thread_ids;
    health.total_checkpoints = stats.checkpoints;
    health.database_path = app_state.database_path.clone();

    Ok(Json(health))
}
