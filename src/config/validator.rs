//! Startup validation of the table allowlist.

use crate::config::ServerConfig;
use crate::error::ConfigError;
use crate::sql::is_valid_identifier;
use std::collections::HashSet;

pub fn validate(config: &ServerConfig) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for t in &config.tables {
        if !is_valid_identifier(&t.name) {
            return Err(ConfigError::InvalidTableName(t.name.clone()));
        }
        if !seen.insert(t.name.as_str()) {
            return Err(ConfigError::DuplicateTable(t.name.clone()));
        }
    }
    if !is_valid_identifier(&config.tenant_column) {
        return Err(ConfigError::Validation(format!(
            "tenant_column '{}' is not a valid identifier",
            config.tenant_column
        )));
    }
    if config.max_limit == 0 {
        return Err(ConfigError::Validation("max_limit must be positive".into()));
    }
    Ok(())
}
