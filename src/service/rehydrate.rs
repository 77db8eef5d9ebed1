//! Re-read written rows so a write response has the same shape as a select.

use crate::config::TableSchema;
use crate::error::AppError;
use crate::service::QueryService;
use crate::sql::{select_by_keys, PgBindValue, Projection};
use crate::tenant::Scope;
use serde_json::Value;
use sqlx::PgConnection;
use std::collections::HashMap;

/// One extra select by `id` when the projection names relations; otherwise the
/// `RETURNING` rows are used as they are. Output follows the order of `returned`.
pub async fn rehydrate(
    conn: &mut PgConnection,
    scope: &Scope<'_>,
    table: &TableSchema,
    projection: &Projection,
    returned: &[Value],
) -> Result<Vec<Value>, AppError> {
    if !projection.has_relations() || returned.is_empty() {
        return Ok(returned.to_vec());
    }
    let keys: Option<Vec<String>> = returned
        .iter()
        .map(|row| row.get("id").filter(|v| !v.is_null()).map(key_text))
        .collect();
    let Some(keys) = keys else {
        tracing::warn!(table = %table.name, "written rows have no id; returning them without relations");
        return Ok(returned.to_vec());
    };

    let binds: Vec<PgBindValue> = keys.iter().cloned().map(PgBindValue::String).collect();
    let q = select_by_keys(scope, table, projection, &binds)?;
    let fetched = QueryService::fetch_rows(&mut *conn, &q).await?;
    let mut by_key: HashMap<String, Value> = fetched
        .into_iter()
        .filter_map(|row| {
            let key = row.get("id").map(key_text)?;
            Some((key, row))
        })
        .collect();
    Ok(keys
        .iter()
        .zip(returned)
        .map(|(key, original)| by_key.remove(key).unwrap_or_else(|| original.clone()))
        .collect())
}

/// Keys are bound untyped and matched by their JSON text, whatever the id column's type.
fn key_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
