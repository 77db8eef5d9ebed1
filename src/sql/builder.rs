//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for an allowlisted table.
//!
//! Every builder runs the tenant check first, so no statement for a scoped table
//! can be produced without its tenant predicate.

use crate::config::TableSchema;
use crate::error::AppError;
use crate::sql::{
    compile_equality_filters, compile_filters, resolve_joins, CompiledStatement, Ident, PgBindValue, Projection,
    RequestParams, ResolvedJoins,
};
use crate::tenant::{Scope, TenantPredicate};
use serde_json::{Map, Value};

/// A compiled select plus the join metadata the rehydrator needs.
#[derive(Clone, Debug)]
pub struct SelectPlan {
    pub statement: CompiledStatement,
    pub joins: ResolvedJoins,
}

fn where_clause(conds: &[String]) -> String {
    if conds.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conds.join(" AND "))
    }
}

/// `col.desc` sorts descending; any other suffix (or none) ascending.
fn order_clause(table: &Ident, order: Option<&str>) -> Result<String, AppError> {
    let Some(order) = order else {
        return Ok(String::new());
    };
    let mut parts = Vec::new();
    for token in order.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (col, dir) = token.split_once('.').unwrap_or((token, ""));
        let col = Ident::new(col)?;
        let dir = if dir == "desc" { "DESC" } else { "ASC" };
        parts.push(format!("{} {}", col.qualified(table), dir));
    }
    if parts.is_empty() {
        return Ok(String::new());
    }
    Ok(format!(" ORDER BY {}", parts.join(", ")))
}

/// SELECT with projection, filters, order and pagination. `limit` is capped at `max_limit`
/// and defaults to it.
pub fn select(
    scope: &Scope<'_>,
    table: &TableSchema,
    projection: &Projection,
    request: &RequestParams,
) -> Result<SelectPlan, AppError> {
    let tenant = scope.enforce(table)?;
    let mut q = CompiledStatement::new();
    let joins = resolve_joins(&mut q, scope, table, projection)?;

    let mut conds = Vec::new();
    if let Some(pred) = &tenant {
        conds.push(pred.render(&mut q, Some(&table.name)));
    }
    conds.extend(compile_filters(&mut q, Some(&table.name), request.pairs())?);

    let order = order_clause(&table.name, request.order())?;
    let max_limit = scope.catalog.max_limit();
    let limit = request.limit().unwrap_or(max_limit).min(max_limit);
    let offset = request
        .offset()
        .filter(|n| *n > 0)
        .map(|n| format!(" OFFSET {}", n))
        .unwrap_or_default();

    q.sql = format!(
        "SELECT {} FROM {}{}{}{} LIMIT {}{}",
        joins.columns.join(", "),
        table.name.quoted(),
        join_text(&joins),
        where_clause(&conds),
        order,
        limit,
        offset
    );
    Ok(SelectPlan { statement: q, joins })
}

fn join_text(joins: &ResolvedJoins) -> String {
    joins.joins.iter().map(|j| format!(" {}", j)).collect()
}

/// SELECT by primary key, same shape as `select` with the same projection. Used after writes.
pub fn select_by_keys(
    scope: &Scope<'_>,
    table: &TableSchema,
    projection: &Projection,
    keys: &[PgBindValue],
) -> Result<CompiledStatement, AppError> {
    let tenant = scope.enforce(table)?;
    let mut q = CompiledStatement::new();
    let joins = resolve_joins(&mut q, scope, table, projection)?;

    let mut conds = Vec::new();
    if let Some(pred) = &tenant {
        conds.push(pred.render(&mut q, Some(&table.name)));
    }
    let id = Ident::new("id")?;
    if keys.is_empty() {
        conds.push("FALSE".into());
    } else {
        let phs: Vec<String> = keys.iter().map(|k| q.push_param(k.clone())).collect();
        conds.push(format!("{} IN ({})", id.qualified(&table.name), phs.join(", ")));
    }

    q.sql = format!(
        "SELECT {} FROM {}{}{}",
        joins.columns.join(", "),
        table.name.quoted(),
        join_text(&joins),
        where_clause(&conds)
    );
    Ok(q)
}

/// Validate field names and apply write rules: an empty string is never a valid
/// foreign key, and a scoped table's tenant column only ever comes from the context.
fn write_fields(
    item: &Map<String, Value>,
    tenant: Option<&TenantPredicate>,
    drop_nulls: bool,
) -> Result<Vec<(Ident, PgBindValue)>, AppError> {
    let mut out = Vec::with_capacity(item.len() + 1);
    for (k, v) in item {
        let col = Ident::new(k)?;
        if drop_nulls && v.is_null() {
            continue;
        }
        if tenant.is_some_and(|t| t.column == col) {
            continue;
        }
        let value = if k.ends_with("_id") && v.as_str() == Some("") {
            PgBindValue::Null
        } else {
            PgBindValue::from_json(v)
        };
        out.push((col, value));
    }
    if drop_nulls {
        if let Some(pred) = tenant {
            out.push((pred.column.clone(), pred.value()));
        }
    }
    Ok(out)
}

/// INSERT one or more rows, `RETURNING *`.
///
/// The column list is the union of every item's fields in first-seen order; an item
/// without a given column contributes `DEFAULT` for it.
pub fn insert(
    scope: &Scope<'_>,
    table: &TableSchema,
    items: &[Map<String, Value>],
) -> Result<CompiledStatement, AppError> {
    let tenant = scope.enforce(table)?;
    if items.is_empty() {
        return Err(AppError::BadRequest("insert body has no rows".into()));
    }
    let rows = items
        .iter()
        .map(|item| write_fields(item, tenant.as_ref(), true))
        .collect::<Result<Vec<_>, _>>()?;

    let mut columns: Vec<Ident> = Vec::new();
    for row in &rows {
        for (col, _) in row {
            if !columns.contains(col) {
                columns.push(col.clone());
            }
        }
    }

    let mut q = CompiledStatement::new();
    if columns.is_empty() {
        if rows.len() > 1 {
            return Err(AppError::BadRequest("bulk insert rows have no fields".into()));
        }
        q.sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING *", table.name.quoted());
        return Ok(q);
    }

    let mut tuples = Vec::with_capacity(rows.len());
    for row in rows {
        let values: Vec<String> = columns
            .iter()
            .map(|col| match row.iter().find(|(c, _)| c == col) {
                Some((_, v)) => q.push_param(v.clone()),
                None => "DEFAULT".to_string(),
            })
            .collect();
        tuples.push(format!("({})", values.join(", ")));
    }
    let cols: Vec<String> = columns.iter().map(Ident::quoted).collect();
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES {} RETURNING *",
        table.name.quoted(),
        cols.join(", "),
        tuples.join(", ")
    );
    Ok(q)
}

fn write_where(
    q: &mut CompiledStatement,
    table: &TableSchema,
    tenant: Option<&TenantPredicate>,
    request: &RequestParams,
    verb: &str,
) -> Result<String, AppError> {
    let mut conds = Vec::new();
    if let Some(pred) = tenant {
        conds.push(pred.render(q, None));
    }
    let filters = compile_equality_filters(q, None, request.pairs())?;
    if filters.is_empty() {
        return Err(AppError::MissingFilter(format!("{} on {}", verb, table.name)));
    }
    conds.extend(filters);
    Ok(where_clause(&conds))
}

/// UPDATE with equality-only filters, `RETURNING *`. `id` and the tenant column are never set.
pub fn update(
    scope: &Scope<'_>,
    table: &TableSchema,
    patch: &Map<String, Value>,
    request: &RequestParams,
) -> Result<CompiledStatement, AppError> {
    let tenant = scope.enforce(table)?;
    let fields: Vec<(Ident, PgBindValue)> = write_fields(patch, tenant.as_ref(), false)?
        .into_iter()
        .filter(|(col, _)| col != "id")
        .collect();
    if fields.is_empty() {
        return Err(AppError::EmptyUpdateSet(table.name.to_string()));
    }

    let mut q = CompiledStatement::new();
    let sets: Vec<String> = fields
        .into_iter()
        .map(|(col, v)| format!("{} = {}", col.quoted(), q.push_param(v)))
        .collect();
    let where_sql = write_where(&mut q, table, tenant.as_ref(), request, "update")?;
    q.sql = format!(
        "UPDATE {} SET {}{} RETURNING *",
        table.name.quoted(),
        sets.join(", "),
        where_sql
    );
    Ok(q)
}

/// DELETE with equality-only filters, `RETURNING *`.
pub fn delete(
    scope: &Scope<'_>,
    table: &TableSchema,
    request: &RequestParams,
) -> Result<CompiledStatement, AppError> {
    let tenant = scope.enforce(table)?;
    let mut q = CompiledStatement::new();
    let where_sql = write_where(&mut q, table, tenant.as_ref(), request, "delete")?;
    q.sql = format!("DELETE FROM {}{} RETURNING *", table.name.quoted(), where_sql);
    Ok(q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServerConfig, TableCatalog, TableConfig};
    use crate::tenant::TenantContext;
    use serde_json::json;

    fn catalog() -> TableCatalog {
        let tables = [
            ("usuarios", false),
            ("negocios", false),
            ("usuarios_negocios", false),
            ("clientes", true),
            ("pedidos", true),
        ]
        .into_iter()
        .map(|(name, tenant_scoped)| TableConfig {
            name: name.into(),
            tenant_scoped,
        })
        .collect();
        let mut config = ServerConfig::with_tables(tables);
        config.max_limit = 500;
        TableCatalog::from_config(&config).unwrap()
    }

    fn request(pairs: &[(&str, &str)]) -> RequestParams {
        RequestParams::new(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    fn object(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn select_with_filter_order_and_limit() {
        let catalog = catalog();
        let ctx = TenantContext::for_tenant("t1");
        let scope = Scope::new(&catalog, &ctx);
        let table = scope.table("clientes").unwrap();
        let req = request(&[("estado", "eq.activo"), ("order", "nombre.asc"), ("limit", "2")]);
        let plan = select(&scope, table, &Projection::parse(req.select()).unwrap(), &req).unwrap();
        assert_eq!(
            plan.statement.sql,
            "SELECT \"clientes\".* FROM \"clientes\" WHERE \"clientes\".\"negocio_id\" = $1 AND \"clientes\".\"estado\" = $2 ORDER BY \"clientes\".\"nombre\" ASC LIMIT 2"
        );
        assert_eq!(
            plan.statement.params,
            vec![PgBindValue::String("t1".into()), PgBindValue::String("activo".into())]
        );
    }

    #[test]
    fn select_caps_limit_and_orders_descending() {
        let catalog = catalog();
        let ctx = TenantContext::none();
        let scope = Scope::new(&catalog, &ctx);
        let table = scope.table("usuarios").unwrap();
        let req = request(&[("order", "creado.desc,email.DESC,nombre"), ("limit", "99999"), ("offset", "40")]);
        let plan = select(&scope, table, &Projection::parse(None).unwrap(), &req).unwrap();
        assert!(plan.statement.sql.ends_with(
            "ORDER BY \"usuarios\".\"creado\" DESC, \"usuarios\".\"email\" ASC, \"usuarios\".\"nombre\" ASC LIMIT 500 OFFSET 40"
        ));

        let plan = select(&scope, table, &Projection::parse(None).unwrap(), &request(&[])).unwrap();
        assert_eq!(plan.statement.sql, "SELECT \"usuarios\".* FROM \"usuarios\" LIMIT 500");
    }

    #[test]
    fn select_rejects_bad_order_column() {
        let catalog = catalog();
        let ctx = TenantContext::none();
        let scope = Scope::new(&catalog, &ctx);
        let table = scope.table("usuarios").unwrap();
        let req = request(&[("order", "nombre;drop.asc")]);
        assert!(matches!(
            select(&scope, table, &Projection::parse(None).unwrap(), &req),
            Err(AppError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn select_with_relation_numbers_join_params_first() {
        let catalog = catalog();
        let ctx = TenantContext::for_tenant("t1");
        let scope = Scope::new(&catalog, &ctx);
        let table = scope.table("pedidos").unwrap();
        let req = request(&[("select", "*,cliente:clientes(nombre)"), ("total", "gt.10")]);
        let plan = select(&scope, table, &Projection::parse(req.select()).unwrap(), &req).unwrap();
        assert_eq!(
            plan.statement.sql,
            "SELECT \"pedidos\".*, CASE WHEN \"cliente_rel\".\"id\" IS NULL THEN NULL ELSE json_build_object('nombre', \"cliente_rel\".\"nombre\") END AS \"cliente\" \
             FROM \"pedidos\" LEFT JOIN \"clientes\" \"cliente_rel\" ON \"cliente_rel\".\"id\" = \"pedidos\".\"cliente_id\" AND \"cliente_rel\".\"negocio_id\" = $1 \
             WHERE \"pedidos\".\"negocio_id\" = $2 AND \"pedidos\".\"total\" > $3 LIMIT 500"
        );
        assert!(plan.statement.placeholders_match_params());
        assert!(plan.joins.has_relations());
    }

    #[test]
    fn scoped_select_without_tenant_fails_before_sql() {
        let catalog = catalog();
        let ctx = TenantContext::none();
        let scope = Scope::new(&catalog, &ctx);
        let table = scope.table("pedidos").unwrap();
        let req = request(&[("estado", "eq.activo")]);
        assert!(matches!(
            select(&scope, table, &Projection::parse(None).unwrap(), &req),
            Err(AppError::TenantRequired(_))
        ));
        assert!(matches!(
            insert(&scope, table, &[object(json!({"nombre": "X"}))]),
            Err(AppError::TenantRequired(_))
        ));
        assert!(matches!(
            update(&scope, table, &object(json!({"nombre": "X"})), &request(&[("id", "eq.1")])),
            Err(AppError::TenantRequired(_))
        ));
        assert!(matches!(
            delete(&scope, table, &request(&[("id", "eq.1")])),
            Err(AppError::TenantRequired(_))
        ));
    }

    #[test]
    fn insert_normalizes_empty_foreign_keys() {
        let catalog = catalog();
        let ctx = TenantContext::none();
        let scope = Scope::new(&catalog, &ctx);
        let table = scope.table("usuarios_negocios").unwrap();
        let q = insert(&scope, table, &[object(json!({"negocio_id": "", "nombre": "X", "nota": null}))]).unwrap();
        assert_eq!(
            q.sql,
            "INSERT INTO \"usuarios_negocios\" (\"negocio_id\", \"nombre\") VALUES ($1, $2) RETURNING *"
        );
        assert_eq!(q.params, vec![PgBindValue::Null, PgBindValue::String("X".into())]);
    }

    #[test]
    fn insert_forces_context_tenant() {
        let catalog = catalog();
        let ctx = TenantContext::for_tenant("t1");
        let scope = Scope::new(&catalog, &ctx);
        let table = scope.table("clientes").unwrap();
        let q = insert(&scope, table, &[object(json!({"nombre": "Alfa", "negocio_id": "t2"}))]).unwrap();
        assert_eq!(
            q.sql,
            "INSERT INTO \"clientes\" (\"nombre\", \"negocio_id\") VALUES ($1, $2) RETURNING *"
        );
        assert_eq!(
            q.params,
            vec![PgBindValue::String("Alfa".into()), PgBindValue::String("t1".into())]
        );
    }

    #[test]
    fn bulk_insert_uses_union_of_columns() {
        let catalog = catalog();
        let ctx = TenantContext::for_tenant("t1");
        let scope = Scope::new(&catalog, &ctx);
        let table = scope.table("clientes").unwrap();
        let items = [
            object(json!({"nombre": "Alfa"})),
            object(json!({"nombre": "Beta", "telefono": "555"})),
        ];
        let q = insert(&scope, table, &items).unwrap();
        assert_eq!(
            q.sql,
            "INSERT INTO \"clientes\" (\"nombre\", \"negocio_id\", \"telefono\") VALUES ($1, $2, DEFAULT), ($3, $4, $5) RETURNING *"
        );
        assert!(q.placeholders_match_params());
    }

    #[test]
    fn insert_edge_cases() {
        let catalog = catalog();
        let ctx = TenantContext::none();
        let scope = Scope::new(&catalog, &ctx);
        let table = scope.table("usuarios").unwrap();
        assert!(matches!(insert(&scope, table, &[]), Err(AppError::BadRequest(_))));
        let q = insert(&scope, table, &[Map::new()]).unwrap();
        assert_eq!(q.sql, "INSERT INTO \"usuarios\" DEFAULT VALUES RETURNING *");
        assert!(matches!(
            insert(&scope, table, &[object(json!({"bad name": 1}))]),
            Err(AppError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn update_sets_fields_and_scopes_where() {
        let catalog = catalog();
        let ctx = TenantContext::for_tenant("t1");
        let scope = Scope::new(&catalog, &ctx);
        let table = scope.table("pedidos").unwrap();
        let patch = object(json!({"cliente_id": "", "estado": "pagado", "id": 9, "negocio_id": "t2"}));
        let req = request(&[("id", "eq.5"), ("total", "gt.1")]);
        let q = update(&scope, table, &patch, &req).unwrap();
        assert_eq!(
            q.sql,
            "UPDATE \"pedidos\" SET \"cliente_id\" = $1, \"estado\" = $2 WHERE \"negocio_id\" = $3 AND \"id\" = $4 RETURNING *"
        );
        assert_eq!(
            q.params,
            vec![
                PgBindValue::Null,
                PgBindValue::String("pagado".into()),
                PgBindValue::String("t1".into()),
                PgBindValue::String("5".into()),
            ]
        );
    }

    #[test]
    fn update_errors() {
        let catalog = catalog();
        let ctx = TenantContext::for_tenant("t1");
        let scope = Scope::new(&catalog, &ctx);
        let table = scope.table("pedidos").unwrap();
        assert!(matches!(
            update(&scope, table, &object(json!({"negocio_id": "t2", "id": 3})), &request(&[("id", "eq.3")])),
            Err(AppError::EmptyUpdateSet(_))
        ));
        assert!(matches!(
            update(&scope, table, &object(json!({"estado": "x"})), &request(&[("total", "gt.3")])),
            Err(AppError::MissingFilter(_))
        ));
    }

    #[test]
    fn delete_is_scoped_and_filtered() {
        let catalog = catalog();
        let ctx = TenantContext::for_tenant("t1");
        let scope = Scope::new(&catalog, &ctx);
        let table = scope.table("pedidos").unwrap();
        let q = delete(&scope, table, &request(&[("id", "eq.7")])).unwrap();
        assert_eq!(
            q.sql,
            "DELETE FROM \"pedidos\" WHERE \"negocio_id\" = $1 AND \"id\" = $2 RETURNING *"
        );
        assert!(matches!(delete(&scope, table, &request(&[])), Err(AppError::MissingFilter(_))));
    }

    #[test]
    fn rehydrate_select_matches_read_shape() {
        let catalog = catalog();
        let ctx = TenantContext::for_tenant("t1");
        let scope = Scope::new(&catalog, &ctx);
        let table = scope.table("pedidos").unwrap();
        let projection = Projection::parse(Some("*,cliente:clientes(nombre)")).unwrap();
        let q = select_by_keys(&scope, table, &projection, &[PgBindValue::String("1".into()), PgBindValue::String("2".into())]).unwrap();
        assert!(q.sql.contains("LEFT JOIN \"clientes\" \"cliente_rel\""));
        assert!(q.sql.ends_with(
            "WHERE \"pedidos\".\"negocio_id\" = $2 AND \"pedidos\".\"id\" IN ($3, $4)"
        ));
        assert!(q.placeholders_match_params());
    }

    #[test]
    fn placeholders_always_match_params() {
        let catalog = catalog();
        let ctx = TenantContext::for_tenant("t1");
        let scope = Scope::new(&catalog, &ctx);
        let table = scope.table("pedidos").unwrap();
        let requests = [
            request(&[]),
            request(&[("estado", "in.(a,b,c)"), ("or", "(total.gt.1,total.lt.0,activo.is.true)")]),
            request(&[("select", "id,cliente:clientes(*)"), ("nota", "is.null"), ("nombre", "like.A%")]),
            request(&[("id", "eq.1"), ("a", "eq.true"), ("b", "bogus.1"), ("c", "is.x")]),
        ];
        for req in &requests {
            let projection = Projection::parse(req.select()).unwrap();
            let plan = select(&scope, table, &projection, req).unwrap();
            assert!(plan.statement.placeholders_match_params(), "{}", plan.statement.sql);
        }
        let plan = select(&scope, table, &Projection::parse(None).unwrap(), &requests[1]).unwrap();
        assert_eq!(
            plan.statement.sql,
            "SELECT \"pedidos\".* FROM \"pedidos\" WHERE \"pedidos\".\"negocio_id\" = $1 \
             AND \"pedidos\".\"estado\" IN ($2, $3, $4) \
             AND (\"pedidos\".\"total\" > $5 OR \"pedidos\".\"total\" < $6 OR \"pedidos\".\"activo\" IS TRUE) LIMIT 500"
        );
        assert_eq!(plan.statement.params[0], PgBindValue::String("t1".into()));
        let q = update(&scope, table, &object(json!({"a": 1, "b": "x"})), &requests[3]).unwrap();
        assert!(q.placeholders_match_params(), "{}", q.sql);
        let q = delete(&scope, table, &requests[3]).unwrap();
        assert!(q.placeholders_match_params(), "{}", q.sql);
    }
}
