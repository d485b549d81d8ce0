use thiserror::Error;

/// Errors raised while compiling a model declaration into a schema.
///
/// These are registration errors: they surface when a model is registered at
/// startup and are not meant to be recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("model `{table}` declares no primary key")]
    MissingPrimaryKey { table: String },
    #[error("model `{table}` declares more than one primary key: {}", fields.join(", "))]
    MultiplePrimaryKeys { table: String, fields: Vec<String> },
    #[error("model `{table}` declares field `{field}` twice")]
    DuplicateField { table: String, field: String },
    #[error("model table name must not be empty")]
    EmptyTableName,
}

/// Quill-specific error type with actionable variants.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Model registration failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// Underlying sqlx error (connection, statement execution, pool timeout).
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    /// A value could not be converted into the requested Rust type.
    #[error("expected {expected}, found {found}")]
    Decode {
        expected: &'static str,
        found: &'static str,
    },
    /// Decoding failed for a named column.
    #[error("column `{column}`: {source}")]
    Column {
        column: String,
        #[source]
        source: Box<OrmError>,
    },
    /// A row did not contain a column the model declares.
    #[error("row has no column `{0}`")]
    MissingColumn(String),
    /// `Model::set_value` was called with a name the model does not declare.
    #[error("model has no field `{0}`")]
    UnknownField(String),
    /// `update`/`remove` need the primary key to be set.
    #[error("primary key `{field}` of `{table}` is not set")]
    PrimaryKeyUnset { table: String, field: String },
    /// A write changed a different number of rows than expected.
    #[error("{operation} on `{table}` affected {actual} rows, expected 1")]
    RowCount {
        operation: &'static str,
        table: String,
        actual: u64,
    },
    /// Invalid pool or connection configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias for Quill operations.
pub type OrmResult<T> = Result<T, OrmError>;

impl OrmError {
    /// Attaches the column name to a decode failure.
    pub fn for_column(self, column: &str) -> Self {
        match self {
            err @ OrmError::Column { .. } => err,
            err => OrmError::Column {
                column: column.to_owned(),
                source: Box::new(err),
            },
        }
    }

    /// Returns true when the error originates from model registration.
    pub fn is_registration(&self) -> bool {
        matches!(self, OrmError::Schema(_))
    }
}
