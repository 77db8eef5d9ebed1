//! Filter compiler: `column=operator.operand` query parameters to SQL predicates.
//!
//! Operands are always bound as parameters, except the tokens `true`, `false` and
//! `null` under `eq`/`is`, which are emitted as SQL literals. A clause with an
//! operator outside the vocabulary is dropped (and logged), not rejected.

use crate::error::AppError;
use crate::sql::request::is_reserved;
use crate::sql::{CompiledStatement, Ident, PgBindValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    Is,
    In,
}

impl FilterOp {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "eq" => FilterOp::Eq,
            "neq" => FilterOp::Neq,
            "gt" => FilterOp::Gt,
            "gte" => FilterOp::Gte,
            "lt" => FilterOp::Lt,
            "lte" => FilterOp::Lte,
            "like" => FilterOp::Like,
            "ilike" => FilterOp::Ilike,
            "is" => FilterOp::Is,
            "in" => FilterOp::In,
            _ => return None,
        })
    }

    fn sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Neq => "<>",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Like => "LIKE",
            FilterOp::Ilike => "ILIKE",
            FilterOp::Is => "IS",
            FilterOp::In => "IN",
        }
    }

    /// Operators usable inside an `or=(...)` group.
    pub fn allowed_in_or(self) -> bool {
        matches!(
            self,
            FilterOp::Eq | FilterOp::Is | FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Literal {
    True,
    False,
    Null,
}

fn literal_token(s: &str) -> Option<Literal> {
    match s {
        "true" => Some(Literal::True),
        "false" => Some(Literal::False),
        "null" => Some(Literal::Null),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterClause {
    pub column: Ident,
    pub op: FilterOp,
    pub operand: String,
}

impl FilterClause {
    /// Parse `operator.operand` for `column`. `Ok(None)` when the operator is not recognised.
    pub fn parse(column: &str, raw: &str) -> Result<Option<Self>, AppError> {
        let column = Ident::new(column)?;
        let Some((op, operand)) = raw.split_once('.') else {
            return Ok(None);
        };
        Ok(FilterOp::parse(op).map(|op| FilterClause {
            column,
            op,
            operand: operand.to_string(),
        }))
    }

    pub fn render(&self, q: &mut CompiledStatement, qualifier: Option<&Ident>) -> String {
        let col = match qualifier {
            Some(t) => self.column.qualified(t),
            None => self.column.quoted(),
        };
        match (self.op, literal_token(&self.operand)) {
            (FilterOp::Eq | FilterOp::Is, Some(Literal::Null)) => format!("{} IS NULL", col),
            (FilterOp::Eq, Some(Literal::True)) => format!("{} = TRUE", col),
            (FilterOp::Eq, Some(Literal::False)) => format!("{} = FALSE", col),
            (FilterOp::Is, Some(Literal::True)) => format!("{} IS TRUE", col),
            (FilterOp::Is, Some(Literal::False)) => format!("{} IS FALSE", col),
            (FilterOp::Is, None) => {
                let ph = q.push_param(PgBindValue::from_operand(&self.operand));
                format!("{} IS NOT DISTINCT FROM {}", col, ph)
            }
            (FilterOp::In, _) => {
                let items = split_list(&self.operand);
                if items.is_empty() {
                    return "FALSE".into();
                }
                let phs: Vec<String> = items
                    .iter()
                    .map(|v| q.push_param(PgBindValue::from_operand(v)))
                    .collect();
                format!("{} IN ({})", col, phs.join(", "))
            }
            (op, _) => {
                let ph = q.push_param(PgBindValue::from_operand(&self.operand));
                format!("{} {} {}", col, op.sql(), ph)
            }
        }
    }
}

/// Compile every non-reserved parameter, plus each `or` group, in request order.
pub fn compile_filters(
    q: &mut CompiledStatement,
    qualifier: Option<&Ident>,
    pairs: &[(String, String)],
) -> Result<Vec<String>, AppError> {
    let mut fragments = Vec::new();
    for (name, raw) in pairs {
        if name == "or" {
            if let Some(group) = compile_or_group(q, qualifier, raw)? {
                fragments.push(group);
            }
            continue;
        }
        if is_reserved(name) {
            continue;
        }
        match FilterClause::parse(name, raw)? {
            Some(clause) => fragments.push(clause.render(q, qualifier)),
            None => tracing::warn!(column = %name, value = %raw, "dropping filter with unknown operator"),
        }
    }
    Ok(fragments)
}

/// `(col.op.operand,col.op.operand,...)` to `(c1 OR c2 ...)`. `None` when no condition survives.
pub fn compile_or_group(
    q: &mut CompiledStatement,
    qualifier: Option<&Ident>,
    raw: &str,
) -> Result<Option<String>, AppError> {
    let inner = strip_parens(raw.trim());
    let mut conds = Vec::new();
    for cond in split_top_level(inner) {
        let mut parts = cond.splitn(3, '.');
        let (Some(col), Some(op), Some(operand)) = (parts.next(), parts.next(), parts.next()) else {
            tracing::warn!(condition = %cond, "dropping malformed or-condition");
            continue;
        };
        let column = Ident::new(col.trim())?;
        match FilterOp::parse(op).filter(|op| op.allowed_in_or()) {
            Some(op) => {
                let clause = FilterClause {
                    column,
                    op,
                    operand: operand.to_string(),
                };
                conds.push(clause.render(q, qualifier));
            }
            None => tracing::warn!(condition = %cond, "dropping or-condition with unsupported operator"),
        }
    }
    if conds.is_empty() {
        return Ok(None);
    }
    Ok(Some(format!("({})", conds.join(" OR "))))
}

/// Only `eq` clauses, for update and delete.
pub fn compile_equality_filters(
    q: &mut CompiledStatement,
    qualifier: Option<&Ident>,
    pairs: &[(String, String)],
) -> Result<Vec<String>, AppError> {
    let mut fragments = Vec::new();
    for (name, raw) in pairs {
        if is_reserved(name) {
            continue;
        }
        match FilterClause::parse(name, raw)? {
            Some(clause) if clause.op == FilterOp::Eq => fragments.push(clause.render(q, qualifier)),
            _ => tracing::warn!(column = %name, value = %raw, "write filters accept eq only; dropping"),
        }
    }
    Ok(fragments)
}

fn strip_parens(s: &str) -> &str {
    s.strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(s)
}

/// Split on commas outside double quotes and parentheses.
pub(crate) fn split_top_level(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => depth -= 1,
            ',' if !in_quotes && depth == 0 => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

/// `(a,b,"c,d")` to `["a", "b", "c,d"]`.
fn split_list(s: &str) -> Vec<String> {
    split_top_level(strip_parens(s.trim()))
        .into_iter()
        .map(|item| {
            let item = item.trim();
            item.strip_prefix('"')
                .and_then(|i| i.strip_suffix('"'))
                .unwrap_or(item)
                .to_string()
        })
        .collect()
}
