//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Bind the user, control and data listeners
//! - Seed the route table from config
//! - Wire the dispatcher to the command bridge
//! - Wire up middleware (tracing, body limits, request ID)
//! - Serve all three listeners until shutdown
//!
//! # Design Decisions
//! - Binding happens before serving so callers can read bound addresses
//!   (port 0 in tests) and commands get the real data API URL
//! - One shutdown signal drains every listener

use std::future::IntoFuture;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{ConnectInfo, DefaultBodyLimit, FromRequest, Request, State},
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::{setup_admin_router, AdminState};
use crate::config::{ListenerConfig, ServerConfig};
use crate::data::setup_data_router;
use crate::dispatch::{CommandBridge, DispatchError, Dispatcher, HandlerRegistry, RequestData};
use crate::http::request::{request_id, with_request_tracing};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::{RouteError, RouteTable};

/// Errors raised while preparing the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {listener} listener on {address}: {source}")]
    Bind {
        listener: &'static str,
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid seed route at position {position}: {source}")]
    SeedRoute {
        position: usize,
        #[source]
        source: RouteError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Addresses the server actually listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundAddrs {
    pub user: SocketAddr,
    pub control: SocketAddr,
    pub data: SocketAddr,
}

/// Application state injected into the user-facing handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
}

/// The command router: user, control and data listeners.
pub struct HttpServer {
    user: TcpListener,
    control: TcpListener,
    data: TcpListener,
    addrs: BoundAddrs,
    table: Arc<RouteTable>,
    registry: Arc<HandlerRegistry>,
    dispatcher: Dispatcher,
    config: ServerConfig,
}

impl HttpServer {
    /// Seed routes, bind every listener and build the dispatcher.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let table = Arc::new(RouteTable::new());
        for (position, seed) in config.routes.iter().enumerate() {
            let new_route = seed
                .to_new_route(&config.execution.default_entrypoint)
                .map_err(|source| ServerError::SeedRoute { position, source })?;
            let route = table.add(new_route);
            tracing::info!(
                route_id = %route.id,
                index = route.index,
                method = %route.method,
                url_pattern = %route.url_pattern,
                "Seed route added"
            );
        }
        metrics::record_route_count(table.len());

        let user = bind_listener("user", &config.user).await?;
        let control = bind_listener("control", &config.control).await?;
        let data = bind_listener("data", &config.data).await?;
        let addrs = BoundAddrs {
            user: user.local_addr()?,
            control: control.local_addr()?,
            data: data.local_addr()?,
        };

        let timeout = match config.execution.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let registry = Arc::new(HandlerRegistry::new());
        let bridge = CommandBridge::new(
            registry.clone(),
            local_url(addrs.data),
            local_url(addrs.control),
        )
        .with_timeout(timeout);
        let dispatcher = Dispatcher::new(table.clone(), Arc::new(bridge));

        Ok(Self {
            user,
            control,
            data,
            addrs,
            table,
            registry,
            dispatcher,
            config,
        })
    }

    pub fn local_addrs(&self) -> BoundAddrs {
        self.addrs
    }

    /// The live route table.
    pub fn table(&self) -> Arc<RouteTable> {
        self.table.clone()
    }

    /// Build the router for user traffic.
    pub fn user_router(&self) -> Router {
        let router = Router::new()
            .fallback(dispatch_handler)
            .with_state(AppState {
                dispatcher: self.dispatcher.clone(),
            })
            .layer(DefaultBodyLimit::max(self.config.execution.max_body_size));
        with_request_tracing(router, "user")
    }

    /// Build the router for the admin API. Handler resources are served
    /// here as well as on the data listener.
    pub fn control_router(&self) -> Router {
        let router = setup_admin_router(AdminState {
            table: self.table.clone(),
            default_entrypoint: Arc::from(self.config.execution.default_entrypoint.as_str()),
        })
        .merge(self.handler_resources());
        with_request_tracing(router, "control")
    }

    /// Build the router for the data API.
    pub fn data_router(&self) -> Router {
        with_request_tracing(self.handler_resources(), "data")
    }

    fn handler_resources(&self) -> Router {
        setup_data_router(self.registry.clone())
            .layer(DefaultBodyLimit::max(self.config.execution.max_body_size))
    }

    /// Serve every listener until `shutdown` fires.
    pub async fn run(self, shutdown: Shutdown) -> Result<(), std::io::Error> {
        tracing::info!(
            user = %self.addrs.user,
            control = %self.addrs.control,
            data = %self.addrs.data,
            routes = self.table.len(),
            "Command router starting"
        );

        let user_app = self
            .user_router()
            .into_make_service_with_connect_info::<SocketAddr>();
        let control_app = self.control_router();
        let data_app = self.data_router();

        let user = axum::serve(self.user, user_app)
            .with_graceful_shutdown(Shutdown::wait(shutdown.subscribe()));
        let control = axum::serve(self.control, control_app)
            .with_graceful_shutdown(Shutdown::wait(shutdown.subscribe()));
        let data = axum::serve(self.data, data_app)
            .with_graceful_shutdown(Shutdown::wait(shutdown.subscribe()));

        tokio::try_join!(user.into_future(), control.into_future(), data.into_future())?;

        tracing::info!("Command router stopped");
        Ok(())
    }
}

async fn bind_listener(
    listener: &'static str,
    config: &ListenerConfig,
) -> Result<TcpListener, ServerError> {
    let socket = TcpListener::bind(&config.bind_address)
        .await
        .map_err(|source| ServerError::Bind {
            listener,
            address: config.bind_address.clone(),
            source,
        })?;
    tracing::debug!(listener, address = %config.bind_address, "Listener bound");
    Ok(socket)
}

/// URL a local command can reach `addr` on.
fn local_url(addr: SocketAddr) -> String {
    let ip = if addr.ip().is_unspecified() {
        match addr.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
        }
    } else {
        addr.ip()
    };
    format!("http://{}", SocketAddr::new(ip, addr.port()))
}

/// Dispatch every user request to the matching route's command.
async fn dispatch_handler(State(state): State<AppState>, request: Request) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers).to_string();
    let method = parts.method.to_string();
    let remote_addr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let mut data = RequestData::from_parts(&parts, remote_addr, Bytes::new());
    data.body = match Bytes::from_request(Request::from_parts(parts, body), &()).await {
        Ok(bytes) => bytes,
        Err(rejection) => {
            tracing::warn!(request_id = %request_id, error = %rejection, "Unreadable request body");
            let response = rejection.into_response();
            metrics::record_request(&method, response.status().as_u16(), start);
            return response;
        }
    };

    tracing::debug!(request_id = %request_id, method = %method, path = %data.path, "Dispatching request");

    let response = match state.dispatcher.dispatch(data).await {
        Ok(dispatched) => {
            metrics::record_command("ok");
            tracing::info!(
                request_id = %request_id,
                route_id = %dispatched.route_id,
                handler_id = %dispatched.handler_id,
                status = dispatched.response.status.as_u16(),
                "Command completed"
            );
            dispatched.response.into_response()
        }
        Err(err) => {
            match &err {
                DispatchError::NoRouteMatched { path, .. } => {
                    tracing::debug!(request_id = %request_id, path = %path, "No route matched");
                }
                DispatchError::CommandExecutionFailed(source) => {
                    metrics::record_command("failed");
                    tracing::error!(request_id = %request_id, error = %source, "Command failed");
                }
            }
            err.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
