use std::collections::HashSet;

use crate::error::SchemaError;
use crate::field::Field;

/// Collects the fields a model declares, in declaration order.
///
/// `#[derive(Model)]` builds one of these in `Model::declare`; the registry
/// compiles it once per dialect into an immutable [`ModelSchema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    table: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Validates the declaration and precompiles the four statement templates.
    ///
    /// `quote` is the dialect's identifier quoting. Templates keep portable `?`
    /// placeholders; the executor rewrites them for the driver.
    pub fn compile(self, quote: fn(&str) -> String) -> Result<ModelSchema, SchemaError> {
        if self.table.trim().is_empty() {
            return Err(SchemaError::EmptyTableName);
        }

        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !seen.insert(field.name()) {
                return Err(SchemaError::DuplicateField {
                    table: self.table.clone(),
                    field: field.name().to_owned(),
                });
            }
        }

        let keys: Vec<&Field> = self.fields.iter().filter(|f| f.is_primary_key()).collect();
        if keys.len() > 1 {
            return Err(SchemaError::MultiplePrimaryKeys {
                table: self.table.clone(),
                fields: keys.iter().map(|f| f.name().to_owned()).collect(),
            });
        }

        let (primary, fields): (Vec<Field>, Vec<Field>) =
            self.fields.into_iter().partition(Field::is_primary_key);
        let Some(primary_key) = primary.into_iter().next() else {
            return Err(SchemaError::MissingPrimaryKey { table: self.table });
        };

        let quoted_table = quote(&self.table);
        let quoted_key = quote(primary_key.name());
        let quoted_fields: Vec<String> = fields.iter().map(|f| quote(f.name())).collect();

        let mut select_columns = Vec::with_capacity(fields.len() + 1);
        select_columns.push(quoted_key.clone());
        select_columns.extend(quoted_fields.iter().cloned());
        let select_sql = format!("SELECT {} FROM {}", select_columns.join(", "), quoted_table);

        let mut insert_columns = quoted_fields.clone();
        insert_columns.push(quoted_key.clone());
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quoted_table,
            insert_columns.join(", "),
            vec!["?"; insert_columns.len()].join(", ")
        );

        // Key-only models assign the key to itself.
        let assignments = if quoted_fields.is_empty() {
            format!("{quoted_key}=?")
        } else {
            quoted_fields
                .iter()
                .map(|col| format!("{col}=?"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let update_sql = format!("UPDATE {quoted_table} SET {assignments} WHERE {quoted_key}=?");
        let delete_sql = format!("DELETE FROM {quoted_table} WHERE {quoted_key}=?");

        let mut columns = Vec::with_capacity(fields.len() + 1);
        columns.push(format!("{} {} PRIMARY KEY", quoted_key, primary_key.sql_type()));
        for (field, quoted) in fields.iter().zip(&quoted_fields) {
            columns.push(format!("{} {}", quoted, field.sql_type()));
        }
        let create_table_sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quoted_table,
            columns.join(", ")
        );

        tracing::debug!(
            table = %self.table,
            primary_key = primary_key.name(),
            fields = fields.len(),
            "compiled model schema"
        );

        Ok(ModelSchema {
            table: self.table,
            quoted_table,
            primary_key,
            fields,
            select_sql,
            insert_sql,
            update_sql,
            delete_sql,
            create_table_sql,
        })
    }
}

/// Compiled, immutable description of a model for one SQL dialect.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    table: String,
    quoted_table: String,
    primary_key: Field,
    fields: Vec<Field>,
    select_sql: String,
    insert_sql: String,
    update_sql: String,
    delete_sql: String,
    create_table_sql: String,
}

impl ModelSchema {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn quoted_table(&self) -> &str {
        &self.quoted_table
    }

    pub fn primary_key(&self) -> &Field {
        &self.primary_key
    }

    /// Non-key fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up any declared field, key included.
    pub fn field(&self, name: &str) -> Option<&Field> {
        if self.primary_key.name() == name {
            return Some(&self.primary_key);
        }
        self.fields.iter().find(|f| f.name() == name)
    }

    /// `SELECT <pk>, <fields> FROM <table>`, without any clause.
    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }

    /// Arguments: every non-key field in order, then the key.
    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    /// Arguments: every non-key field in order, then the key.
    pub fn update_sql(&self) -> &str {
        &self.update_sql
    }

    pub fn delete_sql(&self) -> &str {
        &self.delete_sql
    }

    pub fn create_table_sql(&self) -> &str {
        &self.create_table_sql
    }
}
