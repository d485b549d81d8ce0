use crate::dialect::SqlDialect;
use crate::error::{OrmError, OrmResult, SchemaError};
use crate::executor::{execute, select};
use crate::pool::Pool;
use crate::query::FindOptions;
use crate::registry;
use crate::row::Row;
use crate::schema::{ModelSchema, SchemaBuilder};
use crate::value::Value;

/// Outcome of a single-row write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Exactly one row changed.
    Success,
    /// No row matched.
    NotFound,
    /// More than one row changed.
    Unexpected(u64),
}

impl WriteOutcome {
    pub fn from_rows_affected(rows: u64) -> Self {
        match rows {
            1 => Self::Success,
            0 => Self::NotFound,
            n => Self::Unexpected(n),
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    pub fn rows_affected(self) -> u64 {
        match self {
            Self::Success => 1,
            Self::NotFound => 0,
            Self::Unexpected(n) => n,
        }
    }

    /// Turns anything but [`WriteOutcome::Success`] into [`OrmError::RowCount`].
    pub fn ensure_applied(self, operation: &'static str, table: &str) -> OrmResult<()> {
        if self.is_success() {
            return Ok(());
        }
        Err(OrmError::RowCount {
            operation,
            table: table.to_owned(),
            actual: self.rows_affected(),
        })
    }
}

/// A struct persisted as one row of one table.
///
/// Usually derived with `#[derive(Model)]`. The ORM only reads and writes the
/// instance through [`Model::get_value`] and [`Model::set_value`].
pub trait Model: Sized + Send + Sync + 'static {
    /// Declares the table and its fields.
    fn declare() -> SchemaBuilder;

    /// Current value of a field, `None` when unset.
    fn get_value(&self, name: &str) -> Option<Value>;

    /// Overwrites a field.
    fn set_value(&mut self, name: &str, value: Value) -> OrmResult<()>;

    /// Builds an instance from a selected row.
    fn from_row(row: &Row) -> OrmResult<Self>;

    /// The compiled schema for dialect `DB`, compiled on first use.
    fn schema<DB: SqlDialect>() -> Result<&'static ModelSchema, SchemaError> {
        registry::schema_for::<DB, Self>()
    }
}

/// Persistence operations available on every [`Model`].
#[allow(async_fn_in_trait)]
pub trait ModelExt: Model {
    /// Looks a row up by primary key. A NULL key matches nothing.
    async fn find<DB, K>(pool: &Pool<DB>, pk: K) -> OrmResult<Option<Self>>
    where
        DB: SqlDialect,
        K: Into<Value> + Send;

    /// Selects every row matching `options`.
    async fn find_all<DB: SqlDialect>(pool: &Pool<DB>, options: FindOptions) -> OrmResult<Vec<Self>>;

    /// Runs an aggregate such as `count(id)` and returns its single value.
    async fn find_number<DB: SqlDialect>(
        pool: &Pool<DB>,
        projection: &str,
        filter: Option<&str>,
        args: Vec<Value>,
    ) -> OrmResult<Option<Value>>;

    /// Inserts the instance, filling unset fields from their defaults.
    async fn save<DB: SqlDialect>(&mut self, pool: &Pool<DB>) -> OrmResult<WriteOutcome>;

    /// Writes every field back to the row with this instance's primary key.
    async fn update<DB: SqlDialect>(&mut self, pool: &Pool<DB>) -> OrmResult<WriteOutcome>;

    /// Deletes the row with this instance's primary key.
    async fn remove<DB: SqlDialect>(self, pool: &Pool<DB>) -> OrmResult<WriteOutcome>;
}

impl<M: Model> ModelExt for M {
    async fn find<DB, K>(pool: &Pool<DB>, pk: K) -> OrmResult<Option<Self>>
    where
        DB: SqlDialect,
        K: Into<Value> + Send,
    {
        let schema = M::schema::<DB>()?;
        let pk = pk.into();
        if pk.is_null() {
            return Ok(None);
        }
        let sql = format!(
            "{} WHERE {}=?",
            schema.select_sql(),
            DB::quote_identifier(schema.primary_key().name())
        );
        let rows = select(pool, &sql, &[pk], Some(1)).await?;
        rows.first().map(M::from_row).transpose()
    }

    async fn find_all<DB: SqlDialect>(pool: &Pool<DB>, options: FindOptions) -> OrmResult<Vec<Self>> {
        let schema = M::schema::<DB>()?;
        let (sql, args) = options.render(schema.select_sql());
        let rows = select(pool, &sql, &args, None).await?;
        rows.iter().map(M::from_row).collect()
    }

    async fn find_number<DB: SqlDialect>(
        pool: &Pool<DB>,
        projection: &str,
        filter: Option<&str>,
        args: Vec<Value>,
    ) -> OrmResult<Option<Value>> {
        let schema = M::schema::<DB>()?;
        let mut sql = format!("SELECT {} _num_ FROM {}", projection, schema.quoted_table());
        if let Some(filter) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        let rows = select(pool, &sql, &args, Some(1)).await?;
        Ok(rows.first().and_then(|row| row.get("_num_").cloned()))
    }

    async fn save<DB: SqlDialect>(&mut self, pool: &Pool<DB>) -> OrmResult<WriteOutcome> {
        let schema = M::schema::<DB>()?;
        let mut args = Vec::with_capacity(schema.fields().len() + 1);
        for field in schema.fields() {
            args.push(value_or_default(self, schema, field.name())?);
        }
        args.push(value_or_default(self, schema, schema.primary_key().name())?);

        let rows = execute(pool, schema.insert_sql(), &args, pool.autocommit()).await?;
        Ok(outcome("insert", schema, rows))
    }

    async fn update<DB: SqlDialect>(&mut self, pool: &Pool<DB>) -> OrmResult<WriteOutcome> {
        let schema = M::schema::<DB>()?;
        let key = required_key(self, schema)?;
        let mut args = Vec::with_capacity(schema.fields().len() + 1);
        for field in schema.fields() {
            args.push(value_or_default(self, schema, field.name())?);
        }
        if schema.fields().is_empty() {
            args.push(key.clone());
        }
        args.push(key);

        let rows = execute(pool, schema.update_sql(), &args, pool.autocommit()).await?;
        Ok(outcome("update", schema, rows))
    }

    async fn remove<DB: SqlDialect>(self, pool: &Pool<DB>) -> OrmResult<WriteOutcome> {
        let schema = M::schema::<DB>()?;
        let key = required_key(&self, schema)?;
        let rows = execute(pool, schema.delete_sql(), &[key], pool.autocommit()).await?;
        Ok(outcome("delete", schema, rows))
    }
}

/// Reads a field, substituting and storing the declared default when it is unset.
fn value_or_default<M: Model>(model: &mut M, schema: &ModelSchema, name: &str) -> OrmResult<Value> {
    if let Some(value) = model.get_value(name) {
        return Ok(value);
    }
    let Some(default) = schema.field(name).and_then(|f| f.default()) else {
        return Ok(Value::Null);
    };
    let value = default.resolve();
    tracing::debug!(table = schema.table(), field = name, "using default value");
    model.set_value(name, value.clone())?;
    Ok(value)
}

fn required_key<M: Model>(model: &M, schema: &ModelSchema) -> OrmResult<Value> {
    let name = schema.primary_key().name();
    match model.get_value(name) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(OrmError::PrimaryKeyUnset {
            table: schema.table().to_owned(),
            field: name.to_owned(),
        }),
    }
}

fn outcome(operation: &'static str, schema: &ModelSchema, rows: u64) -> WriteOutcome {
    let outcome = WriteOutcome::from_rows_affected(rows);
    if !outcome.is_success() {
        tracing::warn!(
            operation,
            table = schema.table(),
            rows_affected = rows,
            "failed to {operation} record: affected rows: {rows}"
        );
    }
    outcome
}
