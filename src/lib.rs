//! Tenant REST SDK: declarative, tenant-isolated REST surface over PostgreSQL.
//!
//! Query parameters (`select`, `order`, `limit`, `offset`, `or`, `single` and
//! `column=operator.operand` filters) are compiled into one parameterized statement
//! per request. Scoped tables always carry the tenant predicate.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod notify;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod tenant;

pub use config::{load_from_env, load_from_path, ServerConfig, TableCatalog, TableSchema};
pub use error::{AppError, ConfigError};
pub use notify::{BroadcastChangeSink, ChangeEvent, ChangeKind, ChangeSink, TracingChangeSink};
pub use response::Envelope;
pub use routes::{common_routes, common_routes_with_ready, rest_routes};
pub use service::QueryService;
pub use state::AppState;
pub use store::{connect_pool, connect_pool_lazy, database_url};
pub use tenant::{Scope, TenantContext};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber; `RUST_LOG` overrides `default_directive`.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
