//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! RequestData (method, path, headers, body)
//!     → dispatcher.rs (snapshot scan, first match by index)
//!     → handler.rs (Handler = captured params + request view + response sink)
//!     → bridge.rs (register handler, spawn entrypoint + command, await exit)
//!     → Return: ResponseData written by the command
//! ```
//!
//! # Design Decisions
//! - Commands only see the narrow Handler capability, never the raw request
//! - Handlers are registered for exactly the lifetime of their command
//! - No retries; every failure surfaces once to the caller

pub mod bridge;
pub mod dispatcher;
pub mod handler;

pub use bridge::{BridgeError, CommandBridge, ExecutionBridge, Invocation};
pub use dispatcher::{DispatchError, Dispatched, Dispatcher};
pub use handler::{
    Handler, HandlerId, HandlerRegistry, RequestAccessor, RequestData, ResponseData, ResponseSink,
};
