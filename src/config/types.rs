//! Raw config types matching the JSON config file.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    /// Rows are isolated per tenant. Defaults to true so an omitted flag fails closed.
    #[serde(default = "default_true")]
    pub tenant_scoped: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Seconds a request waits for a free connection before failing.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

/// Whole server config: table allowlist plus runtime limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub tables: Vec<TableConfig>,
    /// Column carrying the tenant id on every scoped table.
    #[serde(default = "default_tenant_column")]
    pub tenant_column: String,
    /// Upper bound applied to `limit`; also the limit used when none is given.
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,
    #[serde(default)]
    pub pool: PoolConfig,
}

fn default_tenant_column() -> String {
    "negocio_id".into()
}

fn default_max_limit() -> u64 {
    1000
}

impl ServerConfig {
    pub fn with_tables(tables: Vec<TableConfig>) -> Self {
        ServerConfig {
            tables,
            tenant_column: default_tenant_column(),
            max_limit: default_max_limit(),
            pool: PoolConfig::default(),
        }
    }
}
