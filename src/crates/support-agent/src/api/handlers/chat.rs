//! `POST /chat`
//!
//! Dispatch table:
//!
//! | command  | thread_id | thread state | action                     |
//! |----------|-----------|--------------|----------------------------|
//! | -        | -         | -            | start with a fresh UUID    |
//! | -        | id        | unknown      | start with `id`            |
//! | -        | id        | interrupted  | resume                     |
//! | -        | id        | finished     | report `already_completed` |
//! | start    | any       | unknown      | start                      |
//! | start    | id        | exists       | 409                        |
//! | resume   | -         | -            | 400                        |
//! | resume   | id        | unknown      | 404                        |

use axum::{body::Bytes, extract::State, Json};
use chat_graph::{Command, GraphInput, GraphState, StateSnapshot, StreamEvent};
use thread_checkpoint::CheckpointConfig;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{prompt_text, ChatCommand, ChatReply, ChatRequestBody};
use crate::api::routes::AppState;
use crate::workflow::initial_state;

/// Handler for POST /chat
///
/// An empty body is treated as `{}` and starts a new conversation.
pub async fn chat(State(app_state): State<AppState>, body: Bytes) -> ApiResult<Json<ChatReply>> {
    let request: ChatRequestBody = if body.iter().all(u8::is_ascii_whitespace) {
        ChatRequestBody::default()
    } else {
        serde_json::from_slice(&body)?
    };

    if matches!(&request.thread_id, Some(id) if id.trim().is_empty()) {
        return Err(ApiError::BadRequest("thread_id must not be empty".to_string()));
    }

    let reply = match (request.command, request.thread_id) {
        (Some(ChatCommand::Start), thread_id) => start(&app_state, thread_id, true).await?,
        (Some(ChatCommand::Resume), None) => {
            return Err(ApiError::BadRequest(
                "thread_id is required to resume a conversation".to_string(),
            ))
        }
        (Some(ChatCommand::Resume), Some(thread_id)) => {
            let snapshot = load_snapshot(&app_state, &thread_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Thread {thread_id} not found")))?;
            continue_thread(&app_state, thread_id, snapshot, request.user_input).await?
        }
        (None, None) => start(&app_state, None, false).await?,
        (None, Some(thread_id)) => match load_snapshot(&app_state, &thread_id).await? {
            None => start(&app_state, Some(thread_id), false).await?,
            Some(snapshot) => continue_thread(&app_state, thread_id, snapshot, request.user_input).await?,
        },
    };

    Ok(Json(reply))
}

async fn load_snapshot(app_state: &AppState, thread_id: &str) -> ApiResult<Option<StateSnapshot>> {
    Ok(app_state
        .graph
        .get_state(&CheckpointConfig::for_thread(thread_id))
        .await?)
}

/// Run a new thread up to its first interrupt
async fn start(app_state: &AppState, thread_id: Option<String>, explicit: bool) -> ApiResult<ChatReply> {
    let thread_id = match thread_id {
        Some(id) => {
            if explicit && load_snapshot(app_state, &id).await?.is_some() {
                return Err(ApiError::Conflict(format!("Thread {id} already exists")));
            }
            id
        }
        None => Uuid::new_v4().to_string(),
    };

    let config = CheckpointConfig::for_thread(&thread_id);
    let events = app_state
        .graph
        .stream(GraphInput::State(initial_state()), &config)
        .await?;

    let prompt = events.iter().rev().find_map(StreamEvent::as_interrupt).map(prompt_text);
    let created = app_state.registry.record_start(&thread_id, prompt.clone()).await;
    tracing::info!(thread_id = %thread_id, created, "Conversation started");

    match prompt {
        Some(prompt) => Ok(ChatReply::interrupted(thread_id, prompt)),
        None => {
            let state = final_state(app_state, &config).await?;
            Ok(ChatReply::completed(thread_id, state.messages, state.processing_complete))
        }
    }
}

/// Resume an interrupted thread, or report that it already finished
async fn continue_thread(
    app_state: &AppState,
    thread_id: String,
    snapshot: StateSnapshot,
    user_input: Option<String>,
) -> ApiResult<ChatReply> {
    if !snapshot.is_interrupted() {
        app_state.registry.touch(&thread_id).await;
        let state = GraphState::from_value(&snapshot.values)?;
        return Ok(ChatReply::already_completed(
            thread_id,
            state.messages,
            state.processing_complete,
        ));
    }

    let user_input = user_input
        .filter(|input| !input.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("user_input is required to resume conversation".to_string()))?;

    let config = CheckpointConfig::for_thread(&thread_id);
    let events = app_state
        .graph
        .stream(Command::resume(user_input).into(), &config)
        .await?;

    if let Some(prompt) = events.iter().rev().find_map(StreamEvent::as_interrupt).map(prompt_text) {
        app_state.registry.record_resume(&thread_id, false).await;
        return Ok(ChatReply::interrupted(thread_id, prompt));
    }

    let state = final_state(app_state, &config).await?;
    app_state.registry.record_resume(&thread_id, true).await;
    tracing::info!(thread_id = %thread_id, messages = state.messages.len(), "Conversation completed");

    Ok(ChatReply::completed(thread_id, state.messages, state.processing_complete))
}

async fn final_state(app_state: &AppState, config: &CheckpointConfig) -> ApiResult<GraphState> {
    let snapshot = app_state
        .graph
        .get_state(config)
        .await?
        .ok_or_else(|| ApiError::InternalError("thread state missing after run".to_string()))?;
    Ok(GraphState::from_value(&snapshot.values)?)
}
