//! Response mapping for dispatch outcomes.
//!
//! # Responsibilities
//! - Map dispatch errors to HTTP status codes
//! - Build API errors whose status line carries the error text
//!
//! # Design Decisions
//! - No matching route is a plain 404
//! - Any command failure (spawn, abnormal exit, timeout) is a 500; the
//!   partial response the command wrote is discarded

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hyper::ext::ReasonPhrase;

use crate::dispatch::DispatchError;

/// Error response with `reason` as both the status-line phrase and the body.
pub fn with_reason(status: StatusCode, reason: &'static str) -> Response {
    let mut response = (status, reason).into_response();
    response
        .extensions_mut()
        .insert(ReasonPhrase::from_static(reason.as_bytes()));
    response
}

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::NoRouteMatched { .. } => StatusCode::NOT_FOUND,
            DispatchError::CommandExecutionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let message = match self {
            DispatchError::NoRouteMatched { .. } => "No matching route found",
            DispatchError::CommandExecutionFailed(_) => "Command execution failed",
        };
        (self.status_code(), message).into_response()
    }
}
