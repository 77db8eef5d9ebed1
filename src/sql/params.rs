//! Convert JSON values and query-string operands to types that sqlx can bind.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

/// A value that can be bound to a PostgreSQL query.
///
/// Strings and nulls are sent with an unspecified type so the server infers it
/// from the column they are compared with or assigned to.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Uuid(uuid::Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Json(Value),
}

impl PgBindValue {
    /// From a JSON request body field.
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::Bool(b) => PgBindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PgBindValue::I64(i)
                } else if let Some(f) = n.as_f64() {
                    PgBindValue::F64(f)
                } else {
                    PgBindValue::String(n.to_string())
                }
            }
            Value::String(s) => Self::from_text(s),
            Value::Array(_) | Value::Object(_) => PgBindValue::Json(v.clone()),
        }
    }

    /// From a raw query-string operand. Operands carry no type of their own, so they are
    /// bound as untyped text and the server resolves them against the column.
    pub fn from_operand(s: &str) -> Self {
        PgBindValue::String(s.to_string())
    }

    fn from_text(s: &str) -> Self {
        if let Ok(u) = uuid::Uuid::parse_str(s) {
            return PgBindValue::Uuid(u);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return PgBindValue::Timestamp(ts.with_timezone(&Utc));
        }
        if s.len() == 10 {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return PgBindValue::Date(d);
            }
        }
        PgBindValue::String(s.to_string())
    }
}

fn unspecified() -> PgTypeInfo {
    PgTypeInfo::with_oid(Oid(0))
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null => <Option<i32> as Encode<Postgres>>::encode_by_ref(&None, buf)?,
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::String(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
            PgBindValue::Uuid(u) => <uuid::Uuid as Encode<Postgres>>::encode_by_ref(u, buf)?,
            PgBindValue::Timestamp(t) => <DateTime<Utc> as Encode<Postgres>>::encode_by_ref(t, buf)?,
            PgBindValue::Date(d) => <NaiveDate as Encode<Postgres>>::encode_by_ref(d, buf)?,
            PgBindValue::Json(v) => <serde_json::Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgBindValue::Null | PgBindValue::String(_) => unspecified(),
            PgBindValue::Bool(_) => <bool as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::I64(_) => <i64 as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::F64(_) => <f64 as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::Uuid(_) => <uuid::Uuid as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::Timestamp(_) => <DateTime<Utc> as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::Date(_) => <NaiveDate as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::Json(_) => <serde_json::Value as sqlx::Type<Postgres>>::type_info(),
        })
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operands_are_bound_as_untyped_text() {
        for raw in ["42", "-1.5", "0042", "activo", "2024-05-01", "7f1c0f5e-4a57-4f0b-9a53-2d1b4b1f8a10"] {
            let v = PgBindValue::from_operand(raw);
            assert_eq!(v, PgBindValue::String(raw.into()));
            assert_eq!(v.produces().map(|t| t.oid()), Some(Some(Oid(0))));
        }
    }

    #[test]
    fn body_values_keep_their_type() {
        assert_eq!(PgBindValue::from_json(&json!(12.5)), PgBindValue::F64(12.5));
        assert!(matches!(PgBindValue::from_json(&json!("2024-05-01")), PgBindValue::Date(_)));
        assert!(matches!(
            PgBindValue::from_json(&json!("7f1c0f5e-4a57-4f0b-9a53-2d1b4b1f8a10")),
            PgBindValue::Uuid(_)
        ));
    }

    #[test]
    fn json_strings_keep_numeric_text() {
        // A numeric-looking JSON string stays text.
        assert_eq!(PgBindValue::from_json(&json!("0042")), PgBindValue::String("0042".into()));
        assert_eq!(PgBindValue::from_json(&json!(7)), PgBindValue::I64(7));
        assert_eq!(PgBindValue::from_json(&json!(null)), PgBindValue::Null);
        assert!(matches!(PgBindValue::from_json(&json!({"a": 1})), PgBindValue::Json(_)));
    }
}
