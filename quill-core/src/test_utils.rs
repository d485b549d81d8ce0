use crate::error::OrmResult;
use crate::pool::{Pool, PoolConfig};

/// Single-connection in-memory SQLite pool.
///
/// Every SQLite connection to `:memory:` opens its own database, so the pool is
/// capped at one connection to keep all statements on the same data.
pub async fn memory_pool() -> OrmResult<Pool<sqlx::Sqlite>> {
    let config = PoolConfig {
        database: ":memory:".to_owned(),
        minsize: 1,
        maxsize: 1,
        ..PoolConfig::default()
    };
    Pool::connect(&config).await
}

/// File-backed SQLite pool with up to `maxsize` connections, created if missing.
pub async fn file_pool(path: &std::path::Path, maxsize: u32) -> OrmResult<Pool<sqlx::Sqlite>> {
    let config = PoolConfig {
        database: path.to_string_lossy().into_owned(),
        minsize: 1,
        maxsize,
        acquire_timeout: 10.0,
        ..PoolConfig::default()
    };
    Pool::connect(&config).await
}
