use std::time::Duration;

use serde::Deserialize;
use sqlx::pool::{PoolConnection, PoolOptions};

use crate::dialect::SqlDialect;
use crate::error::{OrmError, OrmResult};

/// Connection pool settings.
///
/// Missing keys fall back to the defaults below, so a configuration file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub host: String,
    pub port: u16,
    #[serde(alias = "user")]
    pub username: String,
    pub password: String,
    /// Database name, or the file path for SQLite (`:memory:` for an in-memory db).
    #[serde(alias = "db")]
    pub database: String,
    pub charset: String,
    pub autocommit: bool,
    pub minsize: u32,
    pub maxsize: u32,
    /// Seconds a caller waits for a free connection before giving up; fractions allowed.
    pub acquire_timeout: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 3306,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            charset: "utf8mb4".to_owned(),
            autocommit: true,
            minsize: 1,
            maxsize: 10,
            acquire_timeout: 30.0,
        }
    }
}

impl PoolConfig {
    fn validate(&self) -> OrmResult<()> {
        if self.maxsize == 0 {
            return Err(OrmError::Config("maxsize must be at least 1".into()));
        }
        if self.minsize > self.maxsize {
            return Err(OrmError::Config(format!(
                "minsize ({}) exceeds maxsize ({})",
                self.minsize, self.maxsize
            )));
        }
        if !(self.acquire_timeout.is_finite() && self.acquire_timeout > 0.0) {
            return Err(OrmError::Config(format!(
                "acquire_timeout must be a positive number of seconds, got {}",
                self.acquire_timeout
            )));
        }
        Ok(())
    }
}

/// A bounded pool of connections plus the statement autocommit policy.
///
/// Cloning is cheap; clones share the same connections.
pub struct Pool<DB: SqlDialect> {
    inner: sqlx::Pool<DB>,
    autocommit: bool,
}

impl<DB: SqlDialect> Clone for Pool<DB> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            autocommit: self.autocommit,
        }
    }
}

impl<DB: SqlDialect> std::fmt::Debug for Pool<DB> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("database", &DB::NAME)
            .field("size", &self.inner.size())
            .field("idle", &self.inner.num_idle())
            .field("autocommit", &self.autocommit)
            .finish()
    }
}

impl<DB: SqlDialect> Pool<DB> {
    /// Opens the pool, eagerly establishing `minsize` connections.
    pub async fn connect(config: &PoolConfig) -> OrmResult<Self> {
        config.validate()?;
        tracing::info!(
            database = DB::NAME,
            host = %config.host,
            port = config.port,
            db = %config.database,
            minsize = config.minsize,
            maxsize = config.maxsize,
            "create database connection pool"
        );

        let options = DB::connect_options(config)?;
        let inner = PoolOptions::<DB>::new()
            .min_connections(config.minsize)
            .max_connections(config.maxsize)
            .acquire_timeout(Duration::from_secs_f64(config.acquire_timeout))
            .connect_with(options)
            .await?;

        Ok(Self {
            inner,
            autocommit: config.autocommit,
        })
    }

    /// Wraps an existing sqlx pool.
    pub fn from_sqlx(inner: sqlx::Pool<DB>, autocommit: bool) -> Self {
        Self { inner, autocommit }
    }

    /// Waits for a free connection, up to the configured acquire timeout.
    ///
    /// The connection returns to the pool when the guard is dropped.
    pub async fn acquire(&self) -> OrmResult<PoolConnection<DB>> {
        Ok(self.inner.acquire().await?)
    }

    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    pub fn inner(&self) -> &sqlx::Pool<DB> {
        &self.inner
    }

    /// Open connections, idle or in use.
    pub fn size(&self) -> u32 {
        self.inner.size()
    }

    pub fn num_idle(&self) -> usize {
        self.inner.num_idle()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Stops handing out connections and waits for borrowed ones to come back
    /// before closing them.
    pub async fn close(&self) {
        tracing::info!(database = DB::NAME, "close database connection pool");
        self.inner.close().await;
    }
}
