//! Generic select/insert/update/delete execution against PostgreSQL.
//!
//! Each operation compiles its statement before touching the database, then runs it on a
//! connection taken from whatever it is given: a pool, a single connection, or a
//! caller-managed transaction.

use crate::error::AppError;
use crate::service::rehydrate;
use crate::sql::{self, CompiledStatement, Projection, RequestParams};
use crate::tenant::Scope;
use serde_json::{Map, Value};
use sqlx::{Acquire, PgExecutor, Postgres};

pub struct QueryService;

/// Rows a write produced: `returned` are the raw `RETURNING` rows, `rows` the
/// read-shaped rows for the response.
#[derive(Clone, Debug, Default)]
pub struct WriteOutcome {
    pub returned: Vec<Value>,
    pub rows: Vec<Value>,
}

impl QueryService {
    pub async fn select<'c, A>(
        db: A,
        scope: &Scope<'_>,
        table: &str,
        request: &RequestParams,
    ) -> Result<Vec<Value>, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let table = scope.table(table)?;
        let projection = Projection::parse(request.select())?;
        let plan = sql::select(scope, table, &projection, request)?;
        let mut conn = db.acquire().await?;
        Self::fetch_rows(&mut *conn, &plan.statement).await
    }

    /// Insert one or more rows. When the projection names relations, the rows are re-read once.
    pub async fn insert<'c, A>(
        db: A,
        scope: &Scope<'_>,
        table: &str,
        items: &[Map<String, Value>],
        request: &RequestParams,
    ) -> Result<WriteOutcome, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let table = scope.table(table)?;
        let projection = Projection::parse(request.select())?;
        let q = sql::insert(scope, table, items)?;
        let mut conn = db.acquire().await?;
        let returned = Self::fetch_rows(&mut *conn, &q).await?;
        let rows = rehydrate(&mut *conn, scope, table, &projection, &returned).await?;
        Ok(WriteOutcome { returned, rows })
    }

    pub async fn update<'c, A>(
        db: A,
        scope: &Scope<'_>,
        table: &str,
        patch: &Map<String, Value>,
        request: &RequestParams,
    ) -> Result<WriteOutcome, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let table = scope.table(table)?;
        let projection = Projection::parse(request.select())?;
        let q = sql::update(scope, table, patch, request)?;
        let mut conn = db.acquire().await?;
        let returned = Self::fetch_rows(&mut *conn, &q).await?;
        let rows = rehydrate(&mut *conn, scope, table, &projection, &returned).await?;
        Ok(WriteOutcome { returned, rows })
    }

    /// Deleted rows are returned as they were; there is nothing left to rehydrate.
    pub async fn delete<'c, A>(
        db: A,
        scope: &Scope<'_>,
        table: &str,
        request: &RequestParams,
    ) -> Result<WriteOutcome, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let table = scope.table(table)?;
        let q = sql::delete(scope, table, request)?;
        let mut conn = db.acquire().await?;
        let returned = Self::fetch_rows(&mut *conn, &q).await?;
        Ok(WriteOutcome {
            rows: returned.clone(),
            returned,
        })
    }

    /// Run a compiled statement and return each row as a JSON object.
    /// Postgres renders the row (`row_to_json`), so every column type converts the same way.
    pub async fn fetch_rows<'e, E>(executor: E, q: &CompiledStatement) -> Result<Vec<Value>, AppError>
    where
        E: PgExecutor<'e>,
    {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let wrapped = format!("WITH r AS ({}) SELECT row_to_json(r) AS row FROM r", q.sql);
        let mut query = sqlx::query_scalar::<_, Value>(&wrapped);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let rows = query.fetch_all(executor).await?;
        Ok(rows)
    }
}
