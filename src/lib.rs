//! Command router library.
//!
//! An HTTP server whose routes are edited at runtime and whose requests are
//! served by external commands.

// Core subsystems
pub mod config;
pub mod dispatch;
pub mod http;
pub mod routing;

// Control surfaces
pub mod admin;
pub mod data;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
