use serde::Serialize;

use crate::error::{OrmError, OrmResult};

/// A dynamically typed SQL value, used for bound arguments and decoded columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Returns true for SQL `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the value as an integer when it holds one (or a boolean).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(v) => Some(i64::from(*v)),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Value::Text(v) => v.parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::Text(v) => v.parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// Conversion between a struct field and a [`Value`].
///
/// `to_value` returns `None` when the field is unset, which is what makes the
/// declared default kick in on save. Only `Option<T>` fields can be unset.
pub trait FieldValue: Sized {
    fn to_value(&self) -> Option<Value>;
    fn from_value(value: Value) -> OrmResult<Self>;
}

fn mismatch(expected: &'static str, found: &Value) -> OrmError {
    OrmError::Decode {
        expected,
        found: found.kind(),
    }
}

impl FieldValue for String {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Text(self.clone()))
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Text(v) => Ok(v),
            Value::Int(v) => Ok(v.to_string()),
            Value::Float(v) => Ok(v.to_string()),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl FieldValue for bool {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Bool(*self))
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::Int(v) => Ok(v != 0),
            Value::Text(ref v) => match v.as_str() {
                "1" | "true" | "TRUE" => Ok(true),
                "0" | "false" | "FALSE" => Ok(false),
                _ => Err(mismatch("boolean", &value)),
            },
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl FieldValue for i64 {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Int(*self))
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Int(v) => Ok(v),
            Value::Bool(v) => Ok(i64::from(v)),
            Value::Text(ref v) => v.parse().map_err(|_| mismatch("integer", &value)),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl FieldValue for i32 {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Int(i64::from(*self)))
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide).map_err(|_| mismatch("integer", &Value::Int(wide)))
    }
}

impl FieldValue for f64 {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Float(*self))
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            Value::Text(ref v) => v.parse().map_err(|_| mismatch("float", &value)),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn to_value(&self) -> Option<Value> {
        self.as_ref().and_then(FieldValue::to_value)
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_field_is_unset_when_none() {
        let id: Option<String> = None;
        assert_eq!(id.to_value(), None);
        assert_eq!(
            Some("abc".to_owned()).to_value(),
            Some(Value::Text("abc".into()))
        );
    }

    #[test]
    fn booleans_decode_from_integer_storage() {
        assert!(bool::from_value(Value::Int(1)).unwrap());
        assert!(!bool::from_value(Value::Int(0)).unwrap());
        assert!(bool::from_value(Value::Float(1.0)).is_err());
    }

    #[test]
    fn null_only_decodes_into_options() {
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        let err = String::from_value(Value::Null).unwrap_err();
        assert!(err.to_string().contains("expected text"));
    }

    #[test]
    fn floats_accept_integer_storage() {
        assert_eq!(f64::from_value(Value::Int(3)).unwrap(), 3.0);
    }

    #[test]
    fn i32_rejects_overflow() {
        assert!(i32::from_value(Value::Int(i64::MAX)).is_err());
        assert_eq!(i32::from_value(Value::Int(42)).unwrap(), 42);
    }

    #[test]
    fn serializes_as_plain_json_scalars() {
        let json = serde_json::to_string(&vec![
            Value::Null,
            Value::Bool(true),
            Value::Int(3),
            Value::Text("x".into()),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,true,3,"x"]"#);
    }

    #[test]
    fn as_i64_reads_counts() {
        assert_eq!(Value::Int(7).as_i64(), Some(7));
        assert_eq!(Value::Float(2.0).as_i64(), Some(2));
        assert_eq!(Value::Null.as_i64(), None);
    }
}
