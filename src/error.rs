//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid table name in config: '{0}'")]
    InvalidTableName(String),
    #[error("duplicate table in config: {0}")]
    DuplicateTable(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("tenant required for table {0}")]
    TenantRequired(String),
    #[error("update on {0} has no columns to set")]
    EmptyUpdateSet(String),
    #[error("{0} requires at least one equality filter")]
    MissingFilter(String),
    #[error("invalid select: {0}")]
    InvalidProjection(String),
    #[error("constraint violation ({code}): {message}")]
    ConstraintViolation { code: String, message: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("database: {0}")]
    Db(sqlx::Error),
}

impl From<sqlx::Error> for AppError {
    /// Integrity (23xxx) and data (22xxx) errors become `ConstraintViolation`, keeping the SQLSTATE.
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if let Some(code) = db.code() {
                if code.starts_with("23") || code.starts_with("22") {
                    return AppError::ConstraintViolation {
                        code: code.into_owned(),
                        message: db.message().to_string(),
                    };
                }
            }
        }
        AppError::Db(e)
    }
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, "invalid_identifier"),
            AppError::UnknownTable(_) => (StatusCode::NOT_FOUND, "unknown_table"),
            AppError::TenantRequired(_) => (StatusCode::FORBIDDEN, "tenant_required"),
            AppError::EmptyUpdateSet(_) => (StatusCode::BAD_REQUEST, "empty_update_set"),
            AppError::MissingFilter(_) => (StatusCode::BAD_REQUEST, "missing_filter"),
            AppError::InvalidProjection(_) => (StatusCode::BAD_REQUEST, "invalid_select"),
            AppError::ConstraintViolation { code, .. } => match code.as_str() {
                "23505" => (StatusCode::CONFLICT, "unique_violation"),
                "23503" => (StatusCode::BAD_REQUEST, "foreign_key_violation"),
                "23502" => (StatusCode::BAD_REQUEST, "not_null_violation"),
                c if c.starts_with("22") => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_value"),
                _ => (StatusCode::BAD_REQUEST, "constraint_violation"),
            },
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Db(e) => match e {
                sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "not_found"),
                sqlx::Error::PoolTimedOut => (StatusCode::SERVICE_UNAVAILABLE, "pool_timeout"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            },
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub data: Option<serde_json::Value>,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            data: None,
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
