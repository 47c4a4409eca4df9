use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Column, Executor, PgPool, Row, Statement, TypeInfo, ValueRef};

/// Postgres error code for `statement_timeout` cancellation.
const QUERY_CANCELED: &str = "57014";

/// Tabular query result with every value rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug)]
pub enum QueryError {
    Execution(String),
    Timeout(Duration),
    UnsupportedType { column: String, type_name: String },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Execution(msg) => write!(f, "{msg}"),
            QueryError::Timeout(d) => write!(f, "query exceeded {}s timeout", d.as_secs()),
            QueryError::UnsupportedType { column, type_name } => {
                write!(f, "column {column:?} has unsupported type {type_name}")
            }
        }
    }
}

impl std::error::Error for QueryError {}

impl From<sqlx::Error> for QueryError {
    fn from(e: sqlx::Error) -> Self {
        QueryError::Execution(e.to_string())
    }
}

/// Runs assembled report SQL. `params` bind to `$1..$N` in order.
pub trait QueryExecutor: Send + Sync + 'static {
    fn execute(
        &self,
        sql: &str,
        params: &[String],
        timeout: Duration,
    ) -> impl Future<Output = Result<ResultSet, QueryError>> + Send;
}

/// Executor backed by the shared Postgres pool.
#[derive(Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl QueryExecutor for PgExecutor {
    async fn execute(
        &self,
        sql: &str,
        params: &[String],
        timeout: Duration,
    ) -> Result<ResultSet, QueryError> {
        match tokio::time::timeout(timeout, self.run(sql, params, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(QueryError::Timeout(timeout)),
        }
    }
}

impl PgExecutor {
    async fn run(
        &self,
        sql: &str,
        params: &[String],
        timeout: Duration,
    ) -> Result<ResultSet, QueryError> {
        let mut tx = self.pool.begin().await?;

        // Local to the transaction; the pooled connection keeps its default.
        sqlx::query("SELECT set_config('statement_timeout', $1, true)")
            .bind(format!("{}ms", timeout.as_millis()))
            .execute(&mut *tx)
            .await?;

        // Report SQL is rebuilt per request, so skip the statement cache.
        let mut query = sqlx::query(sql).persistent(false);
        for p in params {
            query = query.bind(p.as_str());
        }

        let rows = match query.fetch_all(&mut *tx).await {
            Ok(rows) => rows,
            Err(e) => return Err(classify_error(e, timeout)),
        };

        let result = if rows.is_empty() {
            // No row to read column names from; ask the server instead.
            let stmt = (&mut *tx).prepare(sql).await?;
            ResultSet {
                columns: stmt.columns().iter().map(|c| c.name().to_string()).collect(),
                rows: Vec::new(),
            }
        } else {
            decode_rows(&rows)?
        };

        tx.commit().await?;
        Ok(result)
    }
}

fn classify_error(e: sqlx::Error, timeout: Duration) -> QueryError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some(QUERY_CANCELED) {
            return QueryError::Timeout(timeout);
        }
    }
    QueryError::from(e)
}

fn decode_rows(rows: &[PgRow]) -> Result<ResultSet, QueryError> {
    let columns: Vec<String> = rows[0]
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            values.push(decode_value(row, i)?);
        }
        out.push(values);
    }

    Ok(ResultSet { columns, rows: out })
}

/// Render one column value in its natural text form; NULL is `None`.
fn decode_value(row: &PgRow, i: usize) -> Result<Option<String>, QueryError> {
    if row.try_get_raw(i)?.is_null() {
        return Ok(None);
    }

    let column = &row.columns()[i];
    let type_name = column.type_info().name();
    let text = match type_name {
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => row.try_get::<String, _>(i)?,
        "INT2" => row.try_get::<i16, _>(i)?.to_string(),
        "INT4" => row.try_get::<i32, _>(i)?.to_string(),
        "INT8" => row.try_get::<i64, _>(i)?.to_string(),
        "FLOAT4" => row.try_get::<f32, _>(i)?.to_string(),
        "FLOAT8" => row.try_get::<f64, _>(i)?.to_string(),
        "BOOL" => row.try_get::<bool, _>(i)?.to_string(),
        "DATE" => row.try_get::<NaiveDate, _>(i)?.format("%Y-%m-%d").to_string(),
        "TIMESTAMPTZ" => row.try_get::<DateTime<Utc>, _>(i)?.to_rfc3339(),
        "TIMESTAMP" => row
            .try_get::<NaiveDateTime, _>(i)?
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        "TIME" => row.try_get::<NaiveTime, _>(i)?.format("%H:%M:%S").to_string(),
        other => {
            return Err(QueryError::UnsupportedType {
                column: column.name().to_string(),
                type_name: other.to_string(),
            });
        }
    };
    Ok(Some(text))
}
