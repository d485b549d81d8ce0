use crate::value::Value;

/// The five built-in column kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Bounded-length text, `varchar(100)` unless overridden.
    String,
    Boolean,
    Integer,
    Float,
    /// Unbounded text.
    Text,
}

impl FieldKind {
    /// The SQL type used when the declaration does not override it.
    pub fn default_column_type(self) -> &'static str {
        match self {
            FieldKind::String => "varchar(100)",
            FieldKind::Boolean => "boolean",
            FieldKind::Integer => "bigint",
            FieldKind::Float => "real",
            FieldKind::Text => "text",
        }
    }

    fn default_value(self) -> Option<DefaultValue> {
        match self {
            FieldKind::Boolean => Some(DefaultValue::Literal(Value::Bool(false))),
            FieldKind::Integer => Some(DefaultValue::Literal(Value::Int(0))),
            FieldKind::Float => Some(DefaultValue::Literal(Value::Float(0.0))),
            FieldKind::String | FieldKind::Text => None,
        }
    }
}

/// Default for a column whose value is unset at write time.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    Literal(Value),
    /// Invoked every time a default is needed, e.g. to mint a fresh id.
    Producer(fn() -> Value),
}

impl DefaultValue {
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Producer(produce) => produce(),
        }
    }
}

/// Describes one column of a model.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    column_type: String,
    primary_key: bool,
    default: Option<DefaultValue>,
}

impl Field {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            column_type: kind.default_column_type().to_owned(),
            primary_key: false,
            default: kind.default_value(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// Marks this field as the model's primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Overrides the SQL column type, e.g. `varchar(50)`.
    pub fn column_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = column_type.into();
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Uses `produce` to compute the default at save time rather than declaration time.
    pub fn default_with(mut self, produce: fn() -> Value) -> Self {
        self.default = Some(DefaultValue::Producer(produce));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn sql_type(&self) -> &str {
        &self.column_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{:?}, {}:{}>", self.kind, self.column_type, self.name)
    }
}
