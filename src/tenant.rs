//! Tenant isolation: request tenant context and the per-table scope check.

use crate::config::{TableCatalog, TableSchema};
use crate::error::AppError;
use crate::sql::{CompiledStatement, Ident, PgBindValue};

/// Tenant identity resolved upstream for one request. Never cached across requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: Option<String>,
    pub scoped: bool,
}

impl TenantContext {
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        TenantContext {
            tenant_id: Some(tenant_id.into()),
            scoped: true,
        }
    }

    /// No tenant resolved (e.g. during authentication).
    pub fn none() -> Self {
        TenantContext::default()
    }

    fn active_tenant(&self) -> Option<&str> {
        if !self.scoped {
            return None;
        }
        self.tenant_id.as_deref().filter(|t| !t.is_empty())
    }
}

/// `column = tenant` condition injected for a scoped table.
#[derive(Clone, Debug, PartialEq)]
pub struct TenantPredicate {
    pub column: Ident,
    pub tenant_id: String,
}

impl TenantPredicate {
    /// Untyped, so a numeric-looking id still compares against a text column.
    pub fn value(&self) -> PgBindValue {
        PgBindValue::String(self.tenant_id.clone())
    }

    /// Render against `qualifier` (or unqualified), binding the tenant id.
    pub fn render(&self, q: &mut CompiledStatement, qualifier: Option<&Ident>) -> String {
        let col = match qualifier {
            Some(t) => self.column.qualified(t),
            None => self.column.quoted(),
        };
        let ph = q.push_param(self.value());
        format!("{} = {}", col, ph)
    }
}

/// Catalog plus tenant context for one request. Every builder goes through here.
#[derive(Clone, Copy, Debug)]
pub struct Scope<'a> {
    pub catalog: &'a TableCatalog,
    pub tenant: &'a TenantContext,
}

impl<'a> Scope<'a> {
    pub fn new(catalog: &'a TableCatalog, tenant: &'a TenantContext) -> Self {
        Scope { catalog, tenant }
    }

    pub fn table(&self, name: &str) -> Result<&'a TableSchema, AppError> {
        self.catalog.lookup(name)
    }

    /// Unscoped tables get no predicate. A scoped table without a tenant fails the request.
    pub fn enforce(&self, table: &TableSchema) -> Result<Option<TenantPredicate>, AppError> {
        if !table.tenant_scoped {
            return Ok(None);
        }
        match self.tenant.active_tenant() {
            Some(tenant_id) => Ok(Some(TenantPredicate {
                column: self.catalog.tenant_column().clone(),
                tenant_id: tenant_id.to_string(),
            })),
            None => {
                tracing::info!(table = %table.name, "rejected: tenant required");
                Err(AppError::TenantRequired(table.name.to_string()))
            }
        }
    }
}
