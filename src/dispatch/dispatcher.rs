//! Request dispatch.
//!
//! # Responsibilities
//! - Resolve method + path to the lowest-index matching route
//! - Build the per-request handler from the captured params
//! - Hand the handler to the execution bridge and await it
//!
//! # Design Decisions
//! - Stateless between calls; all state lives in the route table
//! - The snapshot is dropped before the command runs, so a slow command
//!   never holds up admin writes or other dispatches
//! - Failures are returned once, never retried or logged here

use std::sync::Arc;

use thiserror::Error;

use crate::dispatch::bridge::{BridgeError, ExecutionBridge, Invocation};
use crate::dispatch::handler::{Handler, RequestData, ResponseData};
use crate::routing::{Params, Route, RouteId, RouteTable};

/// Errors returned by [`Dispatcher::dispatch`].
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matched {method} {path}")]
    NoRouteMatched { method: String, path: String },

    #[error("command execution failed: {0}")]
    CommandExecutionFailed(#[from] BridgeError),
}

/// Result of a successful dispatch.
#[derive(Debug)]
pub struct Dispatched {
    pub route_id: RouteId,
    pub handler_id: String,
    pub response: ResponseData,
}

/// Resolves inbound requests to routes and runs them.
#[derive(Clone)]
pub struct Dispatcher {
    table: Arc<RouteTable>,
    bridge: Arc<dyn ExecutionBridge>,
}

impl Dispatcher {
    pub fn new(table: Arc<RouteTable>, bridge: Arc<dyn ExecutionBridge>) -> Self {
        Self { table, bridge }
    }

    /// First route by index accepting `method` + `path`, with its captures.
    pub fn resolve(&self, method: &str, path: &str) -> Option<(Route, Params)> {
        let snapshot = self.table.list();
        snapshot
            .iter()
            .find_map(|route| route.matches(method, path).map(|params| (route.clone(), params)))
    }

    /// Run the command of the route matching `request`.
    pub async fn dispatch(&self, request: RequestData) -> Result<Dispatched, DispatchError> {
        let (route, params) = self
            .resolve(request.method.as_str(), &request.path)
            .ok_or_else(|| DispatchError::NoRouteMatched {
                method: request.method.to_string(),
                path: request.path.clone(),
            })?;

        let handler = Arc::new(Handler::new(request, params));

        self.bridge
            .execute(Invocation {
                route_id: route.id,
                entrypoint: route.entrypoint,
                command: route.command,
                handler: handler.clone(),
            })
            .await?;

        Ok(Dispatched {
            route_id: route.id,
            handler_id: handler.id().to_string(),
            response: handler.take_response(),
        })
    }
}
