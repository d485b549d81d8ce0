//! # Quill ORM
//!
//! A small async ORM: each model is compiled once into four fixed SQL
//! templates (select, insert, update, delete) and executed through a bounded
//! connection pool.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quill_orm::prelude::*;
//! use quill_orm::sqlx::Sqlite;
//!
//! fn next_id() -> String {
//!     "u-1".to_owned()
//! }
//!
//! #[derive(Model, Debug)]
//! #[quill(table = "users")]
//! struct User {
//!     #[quill(primary_key, column_type = "varchar(50)", default = "next_id")]
//!     id: Option<String>,
//!     name: String,
//!     admin: bool,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = Pool::<Sqlite>::connect(&PoolConfig {
//!     database: "blog.db".to_owned(),
//!     ..PoolConfig::default()
//! })
//! .await?;
//! Quill::sync::<Sqlite, User>(&pool).await?;
//!
//! let mut user = User { id: None, name: "Alice".to_owned(), admin: false };
//! user.save(&pool).await?;
//! let found = User::find(&pool, user.id.clone()).await?;
//! assert!(found.is_some());
//! # Ok(())
//! # }
//! ```

pub use quill_core::*;
pub use quill_macros::Model;

pub mod integrations;

pub mod prelude {
    pub use quill_core::prelude::*;

    pub use crate::Model; // The derive macro; the trait comes from quill_core.
}
