//! REST API layer
//!
//! - `POST /chat` starts or resumes a conversation
//! - `GET /threads`, `GET /threads/:id/state`, `DELETE /threads/:id`
//! - `GET /health`

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use middleware::{cors_layer, logging_layer};
pub use routes::{create_router, AppState};
