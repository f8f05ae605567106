//! API route definitions

use axum::{
    routing::{get, post},
    Router,
};
use chat_graph::CompiledGraph;
use std::sync::Arc;
use thread_checkpoint::CheckpointSaver;

use crate::api::handlers;
use crate::api::middleware::{cors_layer, logging_layer};
use crate::registry::ThreadRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Compiled workflow, bound to `saver`
    pub graph: CompiledGraph,
    pub saver: Arc<dyn CheckpointSaver>,
    pub registry: ThreadRegistry,
    /// SQLite file backing `saver`, reported by the health check
    pub database_path: Option<String>,
}

impl AppState {
    pub fn new(graph: CompiledGraph, saver: Arc<dyn CheckpointSaver>) -> Self {
        Self {
            graph,
            saver,
            registry: ThreadRegistry::new(),
            database_path: None,
        }
    }

    pub fn with_database_path(mut self, path: impl Into<String>) -> Self {
        self.database_path = Some(path.into());
        self
    }
}

/// Build the complete API router
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/chat", post(handlers::chat))
        .route("/threads", get(handlers::list_threads))
        .route("/threads/:thread_id", axum::routing::delete(handlers::delete_thread))
        .route("/threads/:thread_id/state", get(handlers::get_thread_state))
        .layer(logging_layer())
        .layer(cors_layer())
        .with_state(app_state)
}
