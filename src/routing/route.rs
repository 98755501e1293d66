//! Route definitions.

use std::sync::Arc;

use axum::http::Method;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::routing::matcher::{Params, Pattern, PatternError};

/// Stable route handle, independent of position.
pub type RouteId = Uuid;

/// Errors raised while validating a route definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("invalid HTTP method: {0:?}")]
    InvalidMethod(String),

    #[error("invalid url pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("entrypoint must not be empty")]
    EmptyEntrypoint,
}

/// A validated route definition that has not been placed in a table yet.
#[derive(Debug, Clone)]
pub struct NewRoute {
    method: String,
    url_pattern: String,
    entrypoint: String,
    command: String,
    pattern: Arc<Pattern>,
}

impl NewRoute {
    /// Validate a route definition and compile its pattern.
    pub fn new(
        method: impl Into<String>,
        url_pattern: impl Into<String>,
        entrypoint: impl Into<String>,
        command: impl Into<String>,
    ) -> Result<Self, RouteError> {
        let method = method.into();
        let url_pattern = url_pattern.into();
        let entrypoint = entrypoint.into();

        if Method::from_bytes(method.as_bytes()).is_err() {
            return Err(RouteError::InvalidMethod(method));
        }
        if entrypoint.trim().is_empty() {
            return Err(RouteError::EmptyEntrypoint);
        }
        let pattern = Arc::new(Pattern::parse(&url_pattern)?);

        Ok(Self {
            method,
            url_pattern,
            entrypoint,
            command: command.into(),
            pattern,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url_pattern(&self) -> &str {
        &self.url_pattern
    }

    /// Attach identity and position. Only the route table calls this.
    pub(crate) fn into_route(self, id: RouteId, index: usize) -> Route {
        Route {
            id,
            index,
            method: self.method,
            url_pattern: self.url_pattern,
            entrypoint: self.entrypoint,
            command: self.command,
            pattern: self.pattern,
        }
    }
}

/// One routing rule plus its execution recipe.
#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub id: RouteId,
    pub index: usize,
    pub method: String,
    pub url_pattern: String,
    pub entrypoint: String,
    pub command: String,
    #[serde(skip)]
    pattern: Arc<Pattern>,
}

impl Route {
    /// Returns the captured parameters if this route accepts the request.
    pub fn matches(&self, method: &str, path: &str) -> Option<Params> {
        if self.method != method {
            return None;
        }
        self.pattern.matches(path)
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.index == other.index
            && self.method == other.method
            && self.url_pattern == other.url_pattern
            && self.entrypoint == other.entrypoint
            && self.command == other.command
    }
}

impl Eq for Route {}
