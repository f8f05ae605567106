//! Request handlers

pub mod chat;
pub mod health;
pub mod threads;

pub use chat::chat;
pub use health::health;
pub use threads::{delete_thread, get_thread_state, list_threads};
