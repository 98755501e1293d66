//! Per-request data API.
//!
//! Commands reach their request and response through
//! `GET|PUT /handlers/{handler_id}/{resource}`, where `handler_id` arrives in
//! the `CMDROUTER_HANDLER_ID` environment variable.
//!
//! # Data Flow
//! ```text
//! command (curl, any HTTP client)
//!     → handlers.rs (look up live handler in the registry)
//!     → resource.rs (parse path, read accessor / write sink)
//!     → Handler response buffer (relayed once the command exits)
//! ```

pub mod handlers;
pub mod resource;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use thiserror::Error;

use crate::dispatch::HandlerRegistry;
use crate::http::response::with_reason;
use self::handlers::{read_resource, write_resource};

/// Data API failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataApiError {
    #[error("handler id not found")]
    HandlerNotFound,

    #[error("invalid resource path {0:?}")]
    InvalidResource(String),

    #[error("resource item not found")]
    ItemNotFound,

    #[error("invalid status code")]
    InvalidStatus,

    #[error("invalid header")]
    InvalidHeader,

    #[error("resource is write-only")]
    NotReadable,

    #[error("resource is read-only")]
    NotWritable,
}

impl IntoResponse for DataApiError {
    fn into_response(self) -> Response {
        let (status, reason) = match self {
            DataApiError::HandlerNotFound => (StatusCode::NOT_FOUND, "Handler ID Not Found"),
            DataApiError::InvalidResource(_) => (StatusCode::BAD_REQUEST, "Invalid Resource Path"),
            DataApiError::ItemNotFound => (StatusCode::NOT_FOUND, "Resource Item Not Found"),
            DataApiError::InvalidStatus => (StatusCode::UNPROCESSABLE_ENTITY, "Invalid Status Code"),
            DataApiError::InvalidHeader => (StatusCode::UNPROCESSABLE_ENTITY, "Invalid Header"),
            DataApiError::NotReadable | DataApiError::NotWritable => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
            }
        };
        with_reason(status, reason)
    }
}

pub fn setup_data_router(registry: Arc<HandlerRegistry>) -> Router {
    Router::new()
        .route(
            "/handlers/{id}/{*resource}",
            get(read_resource).put(write_resource),
        )
        .with_state(registry)
}
