//! # support-agent
//!
//! HTTP service demonstrating human-in-the-loop interrupts. Each conversation
//! is a `chat-graph` thread that pauses on a prompt, waits for the client to
//! send `user_input`, then finishes with a reply.
//!
//! ```text
//! POST /chat {}                               -> {thread_id, status: "interrupted", ...}
//! POST /chat {thread_id, user_input: "..."}   -> {status: "completed", messages: [...]}
//! GET  /threads/:id/state                     -> checkpoint snapshot
//! GET  /health                                -> thread and checkpoint counts
//! ```

pub mod api;
pub mod config;
pub mod registry;
pub mod store;
pub mod workflow;

pub use api::{create_router, AppState};
pub use config::{ServerConfig, ServerConfigError, StoreBackend};
pub use registry::{SessionInfo, SessionStatus, ThreadRegistry};
pub use store::open_store;
pub use workflow::{build_workflow, ReplyModel};
