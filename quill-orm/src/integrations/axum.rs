use axum::extract::FromRef;
use quill_core::{Pool, SqlDialect};

/// Axum state wrapper for a Quill pool.
///
/// Handlers extract `State<Pool<DB>>` directly; applications with a larger
/// state embed this and delegate their own `FromRef` impl to it.
pub struct QuillState<DB: SqlDialect> {
    /// The database connection pool.
    pub pool: Pool<DB>,
}

impl<DB: SqlDialect> Clone for QuillState<DB> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

impl<DB: SqlDialect> std::fmt::Debug for QuillState<DB> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuillState").field("pool", &self.pool).finish()
    }
}

impl<DB: SqlDialect> QuillState<DB> {
    pub fn new(pool: Pool<DB>) -> Self {
        Self { pool }
    }
}

impl<DB: SqlDialect> FromRef<QuillState<DB>> for Pool<DB> {
    fn from_ref(state: &QuillState<DB>) -> Self {
        state.pool.clone()
    }
}
