use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};

use crate::data::resource::{self, Resource};
use crate::data::DataApiError;
use crate::dispatch::HandlerRegistry;

pub async fn read_resource(
    State(registry): State<Arc<HandlerRegistry>>,
    Path((id, path)): Path<(String, String)>,
) -> Result<Vec<u8>, DataApiError> {
    let handler = registry.get(&id).ok_or(DataApiError::HandlerNotFound)?;
    let resource = Resource::parse(&path)?;

    tracing::trace!(handler_id = %id, resource = ?resource, "Resource read");
    resource::read(&resource, handler.as_ref())
}

pub async fn write_resource(
    State(registry): State<Arc<HandlerRegistry>>,
    Path((id, path)): Path<(String, String)>,
    body: Bytes,
) -> Result<StatusCode, DataApiError> {
    let handler = registry.get(&id).ok_or(DataApiError::HandlerNotFound)?;
    let resource = Resource::parse(&path)?;

    tracing::trace!(handler_id = %id, resource = ?resource, bytes = body.len(), "Resource write");
    resource::write(&resource, handler.as_ref(), &body)?;
    Ok(StatusCode::OK)
}
