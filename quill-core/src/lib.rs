//! Core of the Quill ORM: field descriptors, the schema compiler and registry,
//! the pooled query executor and the persistence operations on models.

pub use sqlx;

pub mod dialect;
pub mod error;
pub mod executor;
pub mod field;
pub mod metrics;
pub mod model;
pub mod pool;
pub mod query;
pub mod registry;
pub mod row;
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod test_utils;
pub mod value;

pub use dialect::{SqlDialect, rewrite_placeholders};
pub use error::{OrmError, OrmResult, SchemaError};
pub use executor::{execute, select};
pub use field::{DefaultValue, Field, FieldKind};
pub use model::{Model, ModelExt, WriteOutcome};
pub use pool::{Pool, PoolConfig};
pub use query::{FindOptions, Limit};
pub use row::Row;
pub use schema::{ModelSchema, SchemaBuilder};
pub use value::{FieldValue, Value};

pub mod prelude {
    pub use crate::{
        Field, FindOptions, Limit, Model, ModelExt, OrmError, OrmResult, Pool, PoolConfig, Quill,
        Value, WriteOutcome,
    };
}

/// Entry point for model registration.
pub struct Quill;

impl Quill {
    /// Compiles and caches the schema of `M` for `DB`.
    ///
    /// Call this at startup for every model; an error means the model
    /// declaration itself is wrong.
    pub fn register<DB: SqlDialect, M: Model>() -> Result<&'static ModelSchema, SchemaError> {
        M::schema::<DB>()
    }

    /// Registers `M` and creates its table when it does not exist yet.
    ///
    /// Uses the declared column types as-is; there is no migration support.
    pub async fn sync<DB: SqlDialect, M: Model>(pool: &Pool<DB>) -> OrmResult<()> {
        let schema = Self::register::<DB, M>()?;
        execute(pool, schema.create_table_sql(), &[], true).await?;
        Ok(())
    }
}
