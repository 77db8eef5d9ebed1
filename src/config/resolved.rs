//! Resolved table catalog: config validated and flattened for runtime use.

use crate::config::{validate, ServerConfig};
use crate::error::{AppError, ConfigError};
use crate::sql::Ident;
use std::collections::HashMap;

/// One allowlisted table.
#[derive(Clone, Debug)]
pub struct TableSchema {
    pub name: Ident,
    pub tenant_scoped: bool,
}

/// Immutable allowlist of tables, built once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct TableCatalog {
    by_name: HashMap<String, TableSchema>,
    tenant_column: Ident,
    max_limit: u64,
}

impl TableCatalog {
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        validate(config)?;
        let mut by_name = HashMap::new();
        for t in &config.tables {
            let name = Ident::new(&t.name).map_err(|_| ConfigError::InvalidTableName(t.name.clone()))?;
            by_name.insert(
                t.name.clone(),
                TableSchema {
                    name,
                    tenant_scoped: t.tenant_scoped,
                },
            );
        }
        let tenant_column = Ident::new(&config.tenant_column)
            .map_err(|_| ConfigError::Validation(format!("tenant_column '{}'", config.tenant_column)))?;
        Ok(TableCatalog {
            by_name,
            tenant_column,
            max_limit: config.max_limit,
        })
    }

    /// Fails closed: a table outside the allowlist is `UnknownTable`.
    pub fn lookup(&self, name: &str) -> Result<&TableSchema, AppError> {
        self.by_name
            .get(name)
            .ok_or_else(|| AppError::UnknownTable(name.to_string()))
    }

    pub fn tenant_column(&self) -> &Ident {
        &self.tenant_column
    }

    pub fn max_limit(&self) -> u64 {
        self.max_limit
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;

    #[test]
    fn lookup_fails_closed() {
        let config = ServerConfig::with_tables(vec![TableConfig {
            name: "pedidos".into(),
            tenant_scoped: true,
        }]);
        let catalog = TableCatalog::from_config(&config).unwrap();
        assert!(catalog.lookup("pedidos").unwrap().tenant_scoped);
        assert!(matches!(catalog.lookup("secretos"), Err(AppError::UnknownTable(_))));
        assert_eq!(catalog.tenant_column().as_str(), "negocio_id");
    }
}
