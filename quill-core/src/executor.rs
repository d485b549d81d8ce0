use std::time::Instant;

use crate::dialect::SqlDialect;
use crate::error::OrmResult;
use crate::metrics::{record_pool_stats, record_query};
use crate::pool::Pool;
use crate::row::Row;
use crate::value::Value;

/// Runs a SELECT and returns all rows, or at most `size` rows.
///
/// `sql` uses portable `?` placeholders. Only the statement and the argument
/// count are logged, never the argument values.
pub async fn select<DB: SqlDialect>(
    pool: &Pool<DB>,
    sql: &str,
    args: &[Value],
    size: Option<usize>,
) -> OrmResult<Vec<Row>> {
    tracing::info!(sql, args = args.len(), "SQL statement");
    let start = Instant::now();
    let mut conn = pool.acquire().await?;
    record_pool_stats(pool);
    let rows = DB::fetch_rows(&mut *conn, sql, args, size).await?;
    record_query::<DB>("select", start.elapsed());
    tracing::info!(rows = rows.len(), "rows returned");
    Ok(rows)
}

/// Runs one INSERT, UPDATE or DELETE and returns the affected row count.
///
/// When `autocommit` is false the statement is wrapped in its own transaction.
pub async fn execute<DB: SqlDialect>(
    pool: &Pool<DB>,
    sql: &str,
    args: &[Value],
    autocommit: bool,
) -> OrmResult<u64> {
    tracing::info!(sql, args = args.len(), autocommit, "SQL statement");
    let start = Instant::now();
    let mut conn = pool.acquire().await?;
    record_pool_stats(pool);
    let affected = DB::execute_sql(&mut *conn, sql, args, autocommit).await?;
    record_query::<DB>("execute", start.elapsed());
    tracing::info!(rows_affected = affected, "statement executed");
    Ok(affected)
}
