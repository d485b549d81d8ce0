//! Blog backend on top of Quill: users, posts and comments served as JSON.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod humanize;
pub mod models;
pub mod page;
pub mod payload;
pub mod state;

pub use app::build_router;

use quill_orm::{OrmResult, Pool, Quill};

use crate::models::{Blog, Comment, User};

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "quill_blog=debug,quill_core=info,tower_http=info";

#[cfg(not(feature = "mysql"))]
pub type Db = quill_orm::sqlx::Sqlite;
#[cfg(feature = "mysql")]
pub type Db = quill_orm::sqlx::MySql;

/// Registers every model and, when asked to, creates missing tables.
///
/// A registration error means a model declaration is broken; callers should
/// treat it as fatal.
pub async fn init_models(pool: &Pool<Db>, create_tables: bool) -> OrmResult<()> {
    Quill::register::<Db, User>()?;
    Quill::register::<Db, Blog>()?;
    Quill::register::<Db, Comment>()?;

    if create_tables {
        Quill::sync::<Db, User>(pool).await?;
        Quill::sync::<Db, Blog>(pool).await?;
        Quill::sync::<Db, Comment>(pool).await?;
    }
    Ok(())
}
