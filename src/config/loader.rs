//! Load server config from a JSON file or from the environment.

use crate::config::ServerConfig;
use crate::error::ConfigError;
use std::path::Path;

/// Env var naming the config file. Default: `config/tables.json`.
pub const TABLES_CONFIG_ENV: &str = "TABLES_CONFIG";
pub const DEFAULT_TABLES_CONFIG: &str = "config/tables.json";

pub fn load_from_path(path: impl AsRef<Path>) -> Result<ServerConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let config = parse(&raw)?;
    tracing::info!(path = %path.display(), tables = config.tables.len(), "loaded table config");
    Ok(config)
}

pub fn parse(raw: &str) -> Result<ServerConfig, ConfigError> {
    serde_json::from_str(raw).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Reads `.env` (if any), then the file named by `TABLES_CONFIG`.
pub fn load_from_env() -> Result<ServerConfig, ConfigError> {
    dotenvy::dotenv().ok();
    let path = std::env::var(TABLES_CONFIG_ENV).unwrap_or_else(|_| DEFAULT_TABLES_CONFIG.into());
    load_from_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = parse(r#"{ "tables": [ { "name": "usuarios", "tenant_scoped": false }, { "name": "pedidos" } ] }"#).unwrap();
        assert_eq!(config.tenant_column, "negocio_id");
        assert_eq!(config.max_limit, 1000);
        assert_eq!(config.pool.max_connections, 5);
        assert!(!config.tables[0].tenant_scoped);
        assert!(config.tables[1].tenant_scoped);
    }

    #[test]
    fn malformed_json_is_load_error() {
        assert!(matches!(parse("{ tables: "), Err(ConfigError::Load(_))));
    }
}
