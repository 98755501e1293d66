//! Route admin API.
//!
//! | request               | outcome                                  |
//! |-----------------------|------------------------------------------|
//! | `GET /routes`         | 200, routes ordered by index             |
//! | `POST /routes`        | 201, route appended at the end           |
//! | `PUT /routes`         | 201, route inserted at `index`           |
//! | `GET /routes/{id}`    | 200, or 404 `Route Not Found`            |
//! | `DELETE /routes/{id}` | 204, or 404 `Route Not Found`            |
//!
//! Bodies that are not JSON get 400 `Malformed JSON`; JSON that does not
//! describe a valid route gets 422 `Invalid Route`.

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::routing::RouteTable;
use self::handlers::*;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub table: Arc<RouteTable>,
    /// Entrypoint for routes created without one.
    pub default_entrypoint: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route(
            "/routes",
            get(list_routes).post(append_route).put(insert_route),
        )
        .route("/routes/{id}", get(get_route).delete(delete_route))
        .with_state(state)
}
