//! Resource paths exposed to running commands.
//!
//! # Responsibilities
//! - Parse `request/...` and `response/...` paths
//! - Read request fields through [`RequestAccessor`]
//! - Write response fields through [`ResponseSink`]
//!
//! # Design Decisions
//! - Item names may not contain '/'
//! - Single-line values (status, headers, cookies) drop one trailing newline
//!   so `echo value | curl --data-binary @-` does what it looks like
//! - Body writes append verbatim

use axum::http::{header, HeaderName, HeaderValue, StatusCode};

use crate::data::DataApiError;
use crate::dispatch::{RequestAccessor, ResponseSink};

/// A parsed resource path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    RequestMethod,
    RequestPath,
    RequestHost,
    RequestVersion,
    RequestRemote,
    RequestParam(String),
    RequestQuery(String),
    RequestHeader(String),
    RequestCookie(String),
    RequestForm(String),
    RequestBody,
    ResponseStatus,
    ResponseHeader(String),
    ResponseCookie(String),
    ResponseBody,
}

impl Resource {
    /// Parse a path such as `request/params/dirname`.
    pub fn parse(path: &str) -> Result<Self, DataApiError> {
        let invalid = || DataApiError::InvalidResource(path.to_string());

        let mut parts = path.trim_start_matches('/').splitn(3, '/');
        let scope = parts.next().ok_or_else(invalid)?;
        let field = parts.next().ok_or_else(invalid)?;
        let item = parts.next();

        if let Some(name) = item {
            if name.is_empty() || name.contains('/') {
                return Err(invalid());
            }
        }

        let resource = match (scope, field, item) {
            ("request", "method", None) => Resource::RequestMethod,
            ("request", "path", None) => Resource::RequestPath,
            ("request", "host", None) => Resource::RequestHost,
            ("request", "version", None) => Resource::RequestVersion,
            ("request", "remote", None) => Resource::RequestRemote,
            ("request", "params", Some(name)) => Resource::RequestParam(name.to_string()),
            ("request", "query", Some(name)) => Resource::RequestQuery(name.to_string()),
            ("request", "headers", Some(name)) => Resource::RequestHeader(name.to_string()),
            ("request", "cookies", Some(name)) => Resource::RequestCookie(name.to_string()),
            ("request", "form", Some(name)) => Resource::RequestForm(name.to_string()),
            ("request", "body", None) => Resource::RequestBody,
            ("response", "status", None) => Resource::ResponseStatus,
            ("response", "headers", Some(name)) => Resource::ResponseHeader(name.to_string()),
            ("response", "cookies", Some(name)) => Resource::ResponseCookie(name.to_string()),
            ("response", "body", None) => Resource::ResponseBody,
            _ => return Err(invalid()),
        };
        Ok(resource)
    }
}

/// Read a resource from a live handler.
pub fn read<H>(resource: &Resource, handler: &H) -> Result<Vec<u8>, DataApiError>
where
    H: RequestAccessor + ResponseSink,
{
    let value = match resource {
        Resource::RequestMethod => handler.method().to_string(),
        Resource::RequestPath => handler.path().to_string(),
        Resource::RequestHost => handler.host().unwrap_or_default().to_string(),
        Resource::RequestVersion => format!("{:?}", handler.version()),
        Resource::RequestRemote => handler
            .remote_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_default(),
        Resource::RequestParam(name) => found(handler.param(name).map(str::to_string))?,
        Resource::RequestQuery(name) => found(handler.query(name))?,
        Resource::RequestHeader(name) => found(handler.header(name).map(str::to_string))?,
        Resource::RequestCookie(name) => found(handler.cookie(name))?,
        Resource::RequestForm(name) => found(handler.form(name))?,
        Resource::RequestBody => return Ok(handler.body().to_vec()),
        Resource::ResponseStatus => handler.status().as_u16().to_string(),
        Resource::ResponseHeader(_) | Resource::ResponseCookie(_) | Resource::ResponseBody => {
            return Err(DataApiError::NotReadable)
        }
    };
    Ok(value.into_bytes())
}

/// Write a resource on a live handler.
pub fn write<S>(resource: &Resource, sink: &S, value: &[u8]) -> Result<(), DataApiError>
where
    S: ResponseSink,
{
    match resource {
        Resource::ResponseStatus => {
            let status = std::str::from_utf8(single_line(value))
                .ok()
                .and_then(|text| text.trim().parse::<u16>().ok())
                .filter(|code| (100..=599).contains(code))
                .and_then(|code| StatusCode::from_u16(code).ok())
                .ok_or(DataApiError::InvalidStatus)?;
            sink.set_status(status);
        }
        Resource::ResponseHeader(name) => {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| DataApiError::InvalidHeader)?;
            let value = HeaderValue::from_bytes(single_line(value)).map_err(|_| DataApiError::InvalidHeader)?;
            sink.append_header(name, value);
        }
        Resource::ResponseCookie(name) => {
            let mut cookie = format!("{}=", name).into_bytes();
            cookie.extend_from_slice(single_line(value));
            let value = HeaderValue::from_bytes(&cookie).map_err(|_| DataApiError::InvalidHeader)?;
            sink.append_header(header::SET_COOKIE, value);
        }
        Resource::ResponseBody => sink.append_body(value),
        _ => return Err(DataApiError::NotWritable),
    }
    Ok(())
}

fn found(value: Option<String>) -> Result<String, DataApiError> {
    value.ok_or(DataApiError::ItemNotFound)
}

fn single_line(value: &[u8]) -> &[u8] {
    let value = value.strip_suffix(b"\n").unwrap_or(value);
    value.strip_suffix(b"\r").unwrap_or(value)
}
