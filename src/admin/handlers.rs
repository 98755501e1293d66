use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::admin::AdminState;
use crate::config::RouteConfig;
use crate::http::response::with_reason;
use crate::observability::metrics;
use crate::routing::{Route, RouteTableError};

/// Body of `POST /routes` and `PUT /routes`.
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    #[serde(flatten)]
    pub route: RouteConfig,

    /// Target position; required by `PUT /routes`, ignored by `POST`.
    #[serde(default)]
    pub index: Option<usize>,
}

/// Admin API failures.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("invalid route: {0}")]
    InvalidRoute(String),

    #[error("route not found")]
    NotFound,
}

impl From<RouteTableError> for AdminError {
    fn from(err: RouteTableError) -> Self {
        match err {
            RouteTableError::NotFound(_) => AdminError::NotFound,
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "Admin request rejected");
        let (status, reason) = match self {
            AdminError::MalformedJson(_) => (StatusCode::BAD_REQUEST, "Malformed JSON"),
            AdminError::InvalidRoute(_) => (StatusCode::UNPROCESSABLE_ENTITY, "Invalid Route"),
            AdminError::NotFound => (StatusCode::NOT_FOUND, "Route Not Found"),
        };
        with_reason(status, reason)
    }
}

fn parse_route_request(body: &[u8]) -> Result<RouteRequest, AdminError> {
    // Syntax errors and shape errors map to different statuses
    let value: serde_json::Value = serde_json::from_slice(body).map_err(AdminError::MalformedJson)?;
    serde_json::from_value(value).map_err(|e| AdminError::InvalidRoute(e.to_string()))
}

fn parse_id(id: &str) -> Result<Uuid, AdminError> {
    // An id that cannot exist is simply not found
    Uuid::parse_str(id).map_err(|_| AdminError::NotFound)
}

pub async fn list_routes(State(state): State<AdminState>) -> Json<Vec<Route>> {
    Json(state.table.list().to_vec())
}

pub async fn append_route(
    State(state): State<AdminState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Route>), AdminError> {
    let request = parse_route_request(&body)?;
    let new_route = request
        .route
        .to_new_route(&state.default_entrypoint)
        .map_err(|e| AdminError::InvalidRoute(e.to_string()))?;

    let route = state.table.add(new_route);
    metrics::record_route_count(state.table.len());
    tracing::info!(
        route_id = %route.id,
        index = route.index,
        method = %route.method,
        url_pattern = %route.url_pattern,
        "Route appended"
    );

    Ok((StatusCode::CREATED, Json(route)))
}

pub async fn insert_route(
    State(state): State<AdminState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Route>), AdminError> {
    let request = parse_route_request(&body)?;
    let index = request
        .index
        .ok_or_else(|| AdminError::InvalidRoute("missing field `index`".to_string()))?;
    let new_route = request
        .route
        .to_new_route(&state.default_entrypoint)
        .map_err(|e| AdminError::InvalidRoute(e.to_string()))?;

    let route = state.table.insert(index, new_route);
    metrics::record_route_count(state.table.len());
    tracing::info!(
        route_id = %route.id,
        requested_index = index,
        index = route.index,
        method = %route.method,
        url_pattern = %route.url_pattern,
        "Route inserted"
    );

    Ok((StatusCode::CREATED, Json(route)))
}

pub async fn get_route(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<Route>, AdminError> {
    let route = state.table.get(parse_id(&id)?)?;
    Ok(Json(route))
}

pub async fn delete_route(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AdminError> {
    let removed = state.table.delete(parse_id(&id)?)?;
    metrics::record_route_count(state.table.len());
    tracing::info!(
        route_id = %removed.id,
        index = removed.index,
        url_pattern = %removed.url_pattern,
        "Route deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
