//! Table routes: one parameterized path per verb; handlers resolve the table against the allowlist.

use crate::handlers::rest::{delete_rows, insert_rows, select_rows, update_rows};
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted write body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn rest_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/rest/:table",
            get(select_rows)
                .post(insert_rows)
                .patch(update_rows)
                .delete(delete_rows),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
