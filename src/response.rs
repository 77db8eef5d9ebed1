//! Standard `{ data, error }` response envelope.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub data: Value,
    pub error: Option<Value>,
}

impl Envelope {
    pub fn data(data: Value) -> Self {
        Envelope { data, error: None }
    }

    /// An array, or with `single` the first row (null when there is none).
    pub fn rows(rows: Vec<Value>, single: bool) -> Self {
        if single {
            Envelope::data(rows.into_iter().next().unwrap_or(Value::Null))
        } else {
            Envelope::data(Value::Array(rows))
        }
    }
}

pub fn success(status: StatusCode, envelope: Envelope) -> (StatusCode, Json<Envelope>) {
    (status, Json(envelope))
}
