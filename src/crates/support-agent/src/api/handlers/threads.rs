//! Thread inspection and cleanup handlers

use axum::{
    extract::{Path, State},
    Json,
};
use thread_checkpoint::CheckpointConfig;

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{prompt_text, DeleteThreadResponse, ThreadListResponse, ThreadStateResponse};
use crate::api::routes::AppState;

/// Handler for GET /threads/:thread_id/state
pub async fn get_thread_state(
    State(app_state): State<AppState>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadStateResponse>> {
    let snapshot = app_state
        .graph
        .get_state(&CheckpointConfig::for_thread(&thread_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Thread not found".to_string()))?;

    app_state.registry.touch(&thread_id).await;

    let interrupt_message = snapshot
        .interrupts
        .first()
        .map(|pending| prompt_text(&pending.value))
        .unwrap_or_default();

    Ok(Json(ThreadStateResponse {
        thread_id,
        state: snapshot.values,
        next_steps: snapshot.next,
        created_at: snapshot.created_at,
        step: snapshot.step,
        tasks: snapshot.tasks.into_iter().map(|task| task.name).collect(),
        interrupt_message,
    }))
}

/// Handler for GET /threads
///
/// Lists every thread in the checkpoint store, most recently written first.
pub async fn list_threads(State(app_state): State<AppState>) -> ApiResult<Json<ThreadListResponse>> {
    let threads = app_state.saver.list_threads().await?;
    Ok(Json(ThreadListResponse::new(threads)))
}

/// Handler for DELETE /threads/:thread_id
pub async fn delete_thread(
    State(app_state): State<AppState>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<DeleteThreadResponse>> {
    let deleted = app_state.saver.delete_thread(&thread_id).await?;
    app_state.registry.remove(&thread_id).await;

    if deleted == 0 {
        return Err(ApiError::NotFound("Thread not found".to_string()));
    }

    tracing::info!(thread_id = %thread_id, deleted, "Thread deleted");

    Ok(Json(DeleteThreadResponse {
        message: format!("Thread {thread_id} deleted successfully"),
        deleted_checkpoints: deleted,
    }))
}
