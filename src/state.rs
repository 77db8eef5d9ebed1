//! Shared application state for all routes.

use crate::config::TableCatalog;
use crate::notify::ChangeSink;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Immutable table allowlist, loaded once at startup.
    pub catalog: Arc<TableCatalog>,
    pub changes: Arc<dyn ChangeSink>,
}

impl AppState {
    pub fn new(pool: PgPool, catalog: TableCatalog, changes: Arc<dyn ChangeSink>) -> Self {
        AppState {
            pool,
            catalog: Arc::new(catalog),
            changes,
        }
    }
}
