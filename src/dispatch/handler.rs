//! Per-request handler state.
//!
//! A [`Handler`] is what a running command sees of its request: a read-only
//! view of the inbound request ([`RequestAccessor`]) and a write-only sink for
//! the response ([`ResponseSink`]). The [`HandlerRegistry`] makes live handlers
//! reachable by id from the data API.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::body::{Body, Bytes};
use axum::http::{header, request, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Version};
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;

use crate::routing::Params;

/// Random key under which a live handler is exposed.
pub type HandlerId = String;

const HANDLER_ID_LEN: usize = 16;

/// Everything the server captured from the inbound request.
#[derive(Debug, Clone)]
pub struct RequestData {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub version: Version,
    pub headers: HeaderMap,
    pub remote_addr: Option<SocketAddr>,
    pub body: Bytes,
}

impl RequestData {
    /// Build from request head plus an already buffered body.
    pub fn from_parts(parts: &request::Parts, remote_addr: Option<SocketAddr>, body: Bytes) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            version: parts.version,
            headers: parts.headers.clone(),
            remote_addr,
            body,
        }
    }
}

/// The response a command builds up while it runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseData {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Default for ResponseData {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }
}

impl IntoResponse for ResponseData {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Read access to the inbound request.
pub trait RequestAccessor {
    fn method(&self) -> &str;
    fn path(&self) -> &str;
    fn host(&self) -> Option<&str>;
    fn version(&self) -> Version;
    fn remote_addr(&self) -> Option<SocketAddr>;
    /// Captured path parameter.
    fn param(&self, name: &str) -> Option<&str>;
    /// First query-string value for `name`.
    fn query(&self, name: &str) -> Option<String>;
    /// First header value for `name`, case-insensitive.
    fn header(&self, name: &str) -> Option<&str>;
    fn cookie(&self, name: &str) -> Option<String>;
    /// First urlencoded body field for `name`.
    fn form(&self, name: &str) -> Option<String>;
    fn body(&self) -> &[u8];
}

/// Write access to the outbound response.
pub trait ResponseSink {
    fn status(&self) -> StatusCode;
    fn set_status(&self, status: StatusCode);
    fn append_header(&self, name: HeaderName, value: HeaderValue);
    fn append_body(&self, chunk: &[u8]);
}

/// Live per-request capability object.
#[derive(Debug)]
pub struct Handler {
    id: HandlerId,
    params: Params,
    request: RequestData,
    response: Mutex<ResponseData>,
}

impl Handler {
    pub fn new(request: RequestData, params: Params) -> Self {
        let id = std::iter::repeat_with(fastrand::alphanumeric)
            .take(HANDLER_ID_LEN)
            .collect();
        Self {
            id,
            params,
            request,
            response: Mutex::new(ResponseData::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Take the response written so far, leaving a fresh default behind.
    pub fn take_response(&self) -> ResponseData {
        std::mem::take(&mut *self.response())
    }

    fn response(&self) -> MutexGuard<'_, ResponseData> {
        // A panic while holding the lock cannot leave ResponseData half-written
        self.response.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RequestAccessor for Handler {
    fn method(&self) -> &str {
        self.request.method.as_str()
    }

    fn path(&self) -> &str {
        &self.request.path
    }

    fn host(&self) -> Option<&str> {
        self.header(header::HOST.as_str())
    }

    fn version(&self) -> Version {
        self.request.version
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        self.request.remote_addr
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    fn query(&self, name: &str) -> Option<String> {
        let query = self.request.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.request.headers.get(name)?.to_str().ok()
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.request
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }

    fn form(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(&self.request.body)
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    fn body(&self) -> &[u8] {
        &self.request.body
    }
}

impl ResponseSink for Handler {
    fn status(&self) -> StatusCode {
        self.response().status
    }

    fn set_status(&self, status: StatusCode) {
        self.response().status = status;
    }

    fn append_header(&self, name: HeaderName, value: HeaderValue) {
        self.response().headers.append(name, value);
    }

    fn append_body(&self, chunk: &[u8]) {
        self.response().body.extend_from_slice(chunk);
    }
}

/// Live handlers by id.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: DashMap<HandlerId, Arc<Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose a handler until the returned guard is dropped.
    pub fn register(self: &Arc<Self>, handler: Arc<Handler>) -> Registration {
        let id = handler.id().to_string();
        self.handlers.insert(id.clone(), handler);
        Registration {
            registry: self.clone(),
            id,
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Handler>> {
        self.handlers.get(id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Keeps a handler registered; removes it on drop.
#[derive(Debug)]
pub struct Registration {
    registry: Arc<HandlerRegistry>,
    id: HandlerId,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.handlers.remove(&self.id);
    }
}
