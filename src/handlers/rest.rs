//! Table handlers: select, insert, update, delete over any allowlisted table.

use crate::error::AppError;
use crate::notify::{publish_rows, ChangeKind};
use crate::response::{success, Envelope};
use crate::service::QueryService;
use crate::sql::RequestParams;
use crate::state::AppState;
use crate::tenant::{Scope, TenantContext};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// Object or array of objects. The flag tells whether a single object was sent.
fn body_to_items(value: Value) -> Result<(Vec<Map<String, Value>>, bool), AppError> {
    match value {
        Value::Object(m) => Ok((vec![m], true)),
        Value::Array(arr) => {
            let items = arr.into_iter().map(body_to_map).collect::<Result<Vec<_>, _>>()?;
            Ok((items, false))
        }
        _ => Err(AppError::BadRequest("body must be a JSON object or array".into())),
    }
}

pub async fn select_rows(
    State(state): State<AppState>,
    Path(table): Path<String>,
    tenant: TenantContext,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let request = RequestParams::new(pairs);
    let scope = Scope::new(&state.catalog, &tenant);
    let rows = QueryService::select(&state.pool, &scope, &table, &request).await?;
    Ok(success(StatusCode::OK, Envelope::rows(rows, request.single())))
}

pub async fn insert_rows(
    State(state): State<AppState>,
    Path(table): Path<String>,
    tenant: TenantContext,
    Query(pairs): Query<Vec<(String, String)>>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let request = RequestParams::new(pairs);
    let (items, single_body) = body_to_items(body)?;
    let scope = Scope::new(&state.catalog, &tenant);
    let outcome = QueryService::insert(&state.pool, &scope, &table, &items, &request).await?;
    publish_rows(state.changes.as_ref(), ChangeKind::Insert, &table, &outcome.returned);
    Ok(success(
        StatusCode::CREATED,
        Envelope::rows(outcome.rows, single_body || request.single()),
    ))
}

pub async fn update_rows(
    State(state): State<AppState>,
    Path(table): Path<String>,
    tenant: TenantContext,
    Query(pairs): Query<Vec<(String, String)>>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let request = RequestParams::new(pairs);
    let patch = body_to_map(body)?;
    let scope = Scope::new(&state.catalog, &tenant);
    let outcome = QueryService::update(&state.pool, &scope, &table, &patch, &request).await?;
    publish_rows(state.changes.as_ref(), ChangeKind::Update, &table, &outcome.returned);
    Ok(success(StatusCode::OK, Envelope::rows(outcome.rows, request.single())))
}

pub async fn delete_rows(
    State(state): State<AppState>,
    Path(table): Path<String>,
    tenant: TenantContext,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let request = RequestParams::new(pairs);
    let scope = Scope::new(&state.catalog, &tenant);
    let outcome = QueryService::delete(&state.pool, &scope, &table, &request).await?;
    publish_rows(state.changes.as_ref(), ChangeKind::Delete, &table, &outcome.returned);
    Ok(success(StatusCode::OK, Envelope::rows(outcome.rows, request.single())))
}
