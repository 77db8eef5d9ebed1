//! Projection parsing and relation joins.
//!
//! `select=*,cliente:clientes(nombre,telefono)` keeps every column of the primary
//! table and nests the joined client under `cliente`. The join always follows the
//! naming convention `target.id = source.{alias}_id`.

use crate::config::TableSchema;
use crate::error::AppError;
use crate::sql::filter::split_top_level;
use crate::sql::{CompiledStatement, Ident};
use crate::tenant::Scope;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub enum RelationFields {
    All,
    Columns(Vec<Ident>),
}

/// `alias:target(fields)`
#[derive(Clone, Debug, PartialEq)]
pub struct JoinSpec {
    pub alias: Ident,
    pub target: Ident,
    pub fields: RelationFields,
}

/// Parsed `select` parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub all_columns: bool,
    pub columns: Vec<Ident>,
    pub relations: Vec<JoinSpec>,
}

impl Projection {
    /// `None` means `*`.
    pub fn parse(select: Option<&str>) -> Result<Self, AppError> {
        let raw = select.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("*");
        if !balanced(raw) {
            return Err(AppError::InvalidProjection(format!("unbalanced parentheses in '{}'", raw)));
        }
        let mut projection = Projection {
            all_columns: false,
            columns: Vec::new(),
            relations: Vec::new(),
        };
        for token in split_top_level(raw) {
            let token = token.trim();
            if token == "*" {
                projection.all_columns = true;
            } else if token.contains('(') {
                let spec = parse_relation(token)?;
                if projection.relations.iter().any(|r| r.alias == spec.alias) {
                    return Err(AppError::InvalidProjection(format!("duplicate relation alias '{}'", spec.alias)));
                }
                projection.relations.push(spec);
            } else {
                projection.columns.push(Ident::new(token)?);
            }
        }
        Ok(projection)
    }

    pub fn has_relations(&self) -> bool {
        !self.relations.is_empty()
    }
}

fn balanced(s: &str) -> bool {
    let mut depth = 0i32;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

fn parse_relation(token: &str) -> Result<JoinSpec, AppError> {
    let (head, rest) = token
        .split_once('(')
        .ok_or_else(|| AppError::InvalidProjection(token.to_string()))?;
    let inner = rest
        .strip_suffix(')')
        .ok_or_else(|| AppError::InvalidProjection(format!("trailing text after relation in '{}'", token)))?;
    let (alias, target) = match head.split_once(':') {
        Some((alias, target)) => (Ident::new(alias.trim())?, Ident::new(target.trim())?),
        None => {
            let target = Ident::new(head.trim())?;
            (target.clone(), target)
        }
    };
    let names: Vec<&str> = inner.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    if names.is_empty() {
        return Err(AppError::InvalidProjection(format!("relation '{}' lists no fields", alias)));
    }
    let fields = if names.contains(&"*") {
        RelationFields::All
    } else {
        RelationFields::Columns(names.into_iter().map(Ident::new).collect::<Result<_, _>>()?)
    };
    Ok(JoinSpec { alias, target, fields })
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelationMeta {
    pub table: Ident,
    pub fields: RelationFields,
}

/// Column expressions, join clauses and per-alias metadata for one statement.
#[derive(Clone, Debug, Default)]
pub struct ResolvedJoins {
    pub columns: Vec<String>,
    pub joins: Vec<String>,
    pub aliases: BTreeMap<String, RelationMeta>,
}

impl ResolvedJoins {
    pub fn has_relations(&self) -> bool {
        !self.aliases.is_empty()
    }
}

/// Resolve a projection against `table`. Joined scoped tables are tenant-filtered in the ON clause.
pub fn resolve_joins(
    q: &mut CompiledStatement,
    scope: &Scope<'_>,
    table: &TableSchema,
    projection: &Projection,
) -> Result<ResolvedJoins, AppError> {
    let source = &table.name;
    let mut out = ResolvedJoins::default();

    if projection.all_columns {
        out.columns.push(format!("{}.*", source.quoted()));
    }
    for col in &projection.columns {
        out.columns.push(col.qualified(source));
    }
    if out.columns.is_empty() {
        out.columns.push(format!("{}.*", source.quoted()));
    }

    let id = Ident::new("id")?;
    for rel in &projection.relations {
        let target = scope.table(rel.target.as_str())?;
        let tenant = scope.enforce(target)?;
        let slot = Ident::new(&format!("{}_rel", rel.alias))?;

        let mut on = format!(
            "{} = {}",
            id.qualified(&slot),
            rel.alias.fk_suffixed().qualified(source)
        );
        if let Some(pred) = tenant {
            on.push_str(" AND ");
            on.push_str(&pred.render(q, Some(&slot)));
        }
        out.joins.push(format!(
            "LEFT JOIN {} {} ON {}",
            target.name.quoted(),
            slot.quoted(),
            on
        ));

        let object = match &rel.fields {
            RelationFields::All => format!("row_to_json({})", slot.quoted()),
            RelationFields::Columns(fields) => {
                let pairs: Vec<String> = fields
                    .iter()
                    .map(|f| format!("'{}', {}", f, f.qualified(&slot)))
                    .collect();
                format!("json_build_object({})", pairs.join(", "))
            }
        };
        out.columns.push(format!(
            "CASE WHEN {} IS NULL THEN NULL ELSE {} END AS {}",
            id.qualified(&slot),
            object,
            rel.alias.quoted()
        ));
        out.aliases.insert(
            rel.alias.to_string(),
            RelationMeta {
                table: target.name.clone(),
                fields: rel.fields.clone(),
            },
        );
    }
    Ok(out)
}
