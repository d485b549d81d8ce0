use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::dialect::SqlDialect;
use crate::error::SchemaError;
use crate::model::Model;
use crate::schema::ModelSchema;

type SchemaKey = (TypeId, TypeId);

static SCHEMAS: OnceLock<Mutex<HashMap<SchemaKey, &'static ModelSchema>>> = OnceLock::new();

/// Returns the compiled schema for `(M, DB)`, compiling it on first use.
///
/// Successful compilations live for the rest of the process. Failures are not
/// cached, so every attempt to use a broken model reports the error again.
pub fn schema_for<DB, M>() -> Result<&'static ModelSchema, SchemaError>
where
    DB: SqlDialect,
    M: Model,
{
    let key = (TypeId::of::<M>(), TypeId::of::<DB>());
    let cache = SCHEMAS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(schema) = guard.get(&key) {
        return Ok(*schema);
    }

    let schema: &'static ModelSchema = Box::leak(Box::new(M::declare().compile(DB::quote_identifier)?));
    guard.insert(key, schema);
    tracing::debug!(
        model = std::any::type_name::<M>(),
        database = DB::NAME,
        table = schema.table(),
        "registered model"
    );
    Ok(schema)
}

