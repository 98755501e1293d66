//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (user listener)
//!     → server.rs (Axum setup, body limit)
//!     → request.rs (add request ID, open tracing span)
//!     → dispatch (route lookup, command run)
//!     → response.rs (map dispatch errors to status codes)
//!     → Send to client
//! ```
//!
//! The control and data listeners share the same request ID and tracing
//! stack but route to the admin and data APIs.

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, with_request_tracing, X_REQUEST_ID};
pub use server::{AppState, BoundAddrs, HttpServer, ServerError};
