use std::borrow::Cow;

use futures_util::future::BoxFuture;
use sqlx::Database;

use crate::pool::PoolConfig;
use crate::row::Row;
use crate::value::Value;

/// Everything Quill needs from a database driver.
///
/// Statement templates are written with portable `?` placeholders and quoted
/// with [`SqlDialect::quote_identifier`]; the I/O methods translate the
/// placeholders, bind [`Value`]s and decode rows into [`Row`]s.
pub trait SqlDialect: Database {
    /// Returns the placeholder for the `n`-th parameter (1-based), e.g. `?` or `$1`.
    fn placeholder(n: usize) -> String;

    /// Quotes a table or column name.
    fn quote_identifier(ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    /// Builds driver connect options from the pool configuration.
    fn connect_options(
        config: &PoolConfig,
    ) -> Result<<Self::Connection as sqlx::Connection>::Options, sqlx::Error>;

    /// Converts a driver row into a [`Row`].
    fn decode_row(row: &Self::Row) -> Result<Row, sqlx::Error>;

    /// Runs a query and returns every row, or at most `size` rows.
    fn fetch_rows<'c>(
        conn: &'c mut Self::Connection,
        sql: &'c str,
        args: &'c [Value],
        size: Option<usize>,
    ) -> BoxFuture<'c, Result<Vec<Row>, sqlx::Error>>;

    /// Runs one mutating statement and returns the affected row count.
    ///
    /// With `autocommit == false` the statement runs in its own transaction which is
    /// committed on success and rolled back on failure.
    fn execute_sql<'c>(
        conn: &'c mut Self::Connection,
        sql: &'c str,
        args: &'c [Value],
        autocommit: bool,
    ) -> BoxFuture<'c, Result<u64, sqlx::Error>>;
}

/// Rewrites every `?` outside quoted literals and identifiers using `marker(n)`.
///
/// Single quotes, double quotes and backticks all open a quoted run that ends at
/// the next matching quote; doubled quotes inside a run stay inside it.
pub fn rewrite_placeholders(sql: &str, marker: impl Fn(usize) -> String) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut quote: Option<char> = None;
    let mut n = 0;
    for ch in sql.chars() {
        match (quote, ch) {
            (None, '\'' | '"' | '`') => {
                quote = Some(ch);
                out.push(ch);
            }
            (Some(open), _) if ch == open => {
                quote = None;
                out.push(ch);
            }
            (None, '?') => {
                n += 1;
                out.push_str(&marker(n));
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Translates a portable template into the driver's placeholder syntax.
pub fn native_sql<DB: SqlDialect>(sql: &str) -> Cow<'_, str> {
    if DB::placeholder(1) == "?" {
        Cow::Borrowed(sql)
    } else {
        Cow::Owned(rewrite_placeholders(sql, DB::placeholder))
    }
}

#[inline(always)]
fn bind_value<'q, DB>(
    query: sqlx::query::Query<'q, DB, <DB as Database>::Arguments<'q>>,
    value: &Value,
) -> sqlx::query::Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    String: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    i64: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    f64: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    bool: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    Option<String>: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
{
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.clone()),
    }
}

// The I/O bodies are identical for every driver but need the concrete types to
// satisfy sqlx's executor bounds, so each impl stamps them out.
macro_rules! sqlx_io_methods {
    () => {
        fn fetch_rows<'c>(
            conn: &'c mut Self::Connection,
            sql: &'c str,
            args: &'c [Value],
            size: Option<usize>,
        ) -> BoxFuture<'c, Result<Vec<Row>, sqlx::Error>> {
            Box::pin(async move {
                use futures_util::{StreamExt, TryStreamExt};

                let sql = native_sql::<Self>(sql);
                let query = args.iter().fold(sqlx::query(&sql), bind_value);
                let rows = match size {
                    Some(limit) => {
                        query
                            .fetch(&mut *conn)
                            .take(limit)
                            .try_collect::<Vec<_>>()
                            .await?
                    }
                    None => query.fetch_all(&mut *conn).await?,
                };
                rows.iter().map(Self::decode_row).collect()
            })
        }

        fn execute_sql<'c>(
            conn: &'c mut Self::Connection,
            sql: &'c str,
            args: &'c [Value],
            autocommit: bool,
        ) -> BoxFuture<'c, Result<u64, sqlx::Error>> {
            Box::pin(async move {
                let sql = native_sql::<Self>(sql);
                let query = args.iter().fold(sqlx::query(&sql), bind_value);
                if autocommit {
                    return Ok(query.execute(&mut *conn).await?.rows_affected());
                }

                let mut tx = sqlx::Connection::begin(&mut *conn).await?;
                match query.execute(&mut *tx).await {
                    Ok(done) => {
                        tx.commit().await?;
                        Ok(done.rows_affected())
                    }
                    Err(err) => {
                        if let Err(rollback) = tx.rollback().await {
                            tracing::warn!(error = %rollback, "rollback failed");
                        }
                        Err(err)
                    }
                }
            })
        }
    };
}

#[cfg(feature = "sqlite")]
impl SqlDialect for sqlx::Sqlite {
    fn placeholder(_n: usize) -> String {
        "?".to_owned()
    }

    fn connect_options(
        config: &PoolConfig,
    ) -> Result<sqlx::sqlite::SqliteConnectOptions, sqlx::Error> {
        use std::str::FromStr;

        if config.database == ":memory:" || config.database.is_empty() {
            return sqlx::sqlite::SqliteConnectOptions::from_str("sqlite::memory:");
        }
        Ok(sqlx::sqlite::SqliteConnectOptions::new()
            .filename(&config.database)
            .create_if_missing(true))
    }

    fn decode_row(row: &sqlx::sqlite::SqliteRow) -> Result<Row, sqlx::Error> {
        use sqlx::{Column, Row as _, TypeInfo, ValueRef};

        let mut out = Row::with_capacity(row.columns().len());
        for (idx, column) in row.columns().iter().enumerate() {
            let raw = row.try_get_raw(idx)?;
            // SQLite reports the storage class of the value, not the declared type.
            let value = if raw.is_null() {
                Value::Null
            } else {
                match raw.type_info().name() {
                    "BOOLEAN" => Value::Bool(row.try_get_unchecked::<bool, _>(idx)?),
                    "INTEGER" | "BIGINT" | "INT8" => Value::Int(row.try_get_unchecked::<i64, _>(idx)?),
                    "REAL" | "NUMERIC" => Value::Float(row.try_get_unchecked::<f64, _>(idx)?),
                    "BLOB" => {
                        let bytes = row.try_get_unchecked::<Vec<u8>, _>(idx)?;
                        Value::Text(String::from_utf8_lossy(&bytes).into_owned())
                    }
                    _ => Value::Text(row.try_get_unchecked::<String, _>(idx)?),
                }
            };
            out.push(column.name(), value);
        }
        Ok(out)
    }

    sqlx_io_methods!();
}

#[cfg(feature = "mysql")]
impl SqlDialect for sqlx::MySql {
    fn placeholder(_n: usize) -> String {
        "?".to_owned()
    }

    fn connect_options(
        config: &PoolConfig,
    ) -> Result<sqlx::mysql::MySqlConnectOptions, sqlx::Error> {
        Ok(sqlx::mysql::MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database)
            .charset(&config.charset))
    }

    fn decode_row(row: &sqlx::mysql::MySqlRow) -> Result<Row, sqlx::Error> {
        use sqlx::{Column, Row as _, TypeInfo, ValueRef};

        let mut out = Row::with_capacity(row.columns().len());
        for (idx, column) in row.columns().iter().enumerate() {
            let raw = row.try_get_raw(idx)?;
            let value = if raw.is_null() {
                Value::Null
            } else {
                let name = raw.type_info().name().to_owned();
                match name.as_str() {
                    "BOOLEAN" => Value::Bool(row.try_get_unchecked::<bool, _>(idx)?),
                    "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
                        Value::Int(row.try_get_unchecked::<i64, _>(idx)?)
                    }
                    "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED"
                    | "INT UNSIGNED" => Value::Int(row.try_get_unchecked::<i64, _>(idx)?),
                    "BIGINT UNSIGNED" => {
                        let wide = row.try_get_unchecked::<u64, _>(idx)?;
                        Value::Int(i64::try_from(wide).unwrap_or(i64::MAX))
                    }
                    "FLOAT" | "DOUBLE" => Value::Float(row.try_get_unchecked::<f64, _>(idx)?),
                    // DECIMAL arrives as text; callers parse it through FieldValue.
                    _ => Value::Text(row.try_get_unchecked::<String, _>(idx)?),
                }
            };
            out.push(column.name(), value);
        }
        Ok(out)
    }

    sqlx_io_methods!();
}

#[cfg(feature = "postgres")]
impl SqlDialect for sqlx::Postgres {
    fn placeholder(n: usize) -> String {
        format!("${}", n)
    }

    fn quote_identifier(ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn connect_options(
        config: &PoolConfig,
    ) -> Result<sqlx::postgres::PgConnectOptions, sqlx::Error> {
        Ok(sqlx::postgres::PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database))
    }

    fn decode_row(row: &sqlx::postgres::PgRow) -> Result<Row, sqlx::Error> {
        use sqlx::{Column, Row as _, TypeInfo, ValueRef};

        let mut out = Row::with_capacity(row.columns().len());
        for (idx, column) in row.columns().iter().enumerate() {
            let raw = row.try_get_raw(idx)?;
            let value = if raw.is_null() {
                Value::Null
            } else {
                let name = raw.type_info().name().to_owned();
                match name.as_str() {
                    "BOOL" => Value::Bool(row.try_get::<bool, _>(idx)?),
                    "INT2" => Value::Int(i64::from(row.try_get::<i16, _>(idx)?)),
                    "INT4" => Value::Int(i64::from(row.try_get::<i32, _>(idx)?)),
                    "INT8" => Value::Int(row.try_get::<i64, _>(idx)?),
                    "FLOAT4" => Value::Float(f64::from(row.try_get::<f32, _>(idx)?)),
                    "FLOAT8" => Value::Float(row.try_get::<f64, _>(idx)?),
                    _ => Value::Text(row.try_get::<String, _>(idx)?),
                }
            };
            out.push(column.name(), value);
        }
        Ok(out)
    }

    sqlx_io_methods!();
}
