//! Serializer boundary
//!
//! Literal operands reach the query document through a [`Serializer`]. The
//! default [`JsonSerializer`] maps literals onto extended-JSON values.

use serde_json::{json, Number, Value};
use thiserror::Error;

use crate::expression::{LiteralValue, TypeRef};

/// Failure to convert a literal into a query value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SerializationError {
    #[error("Values of type {type_name} cannot be used in a query document")]
    UnsupportedValueType { type_name: String },
}

impl SerializationError {
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        SerializationError::UnsupportedValueType {
            type_name: type_name.into(),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            SerializationError::UnsupportedValueType { type_name } => type_name,
        }
    }
}

/// Converts typed literals into query-document values.
///
/// Implementations must be deterministic.
pub trait Serializer: Send + Sync {
    fn serialize(&self, value: &LiteralValue, declared: &TypeRef) -> Result<Value, SerializationError>;
}

/// Extended-JSON serializer
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, value: &LiteralValue, declared: &TypeRef) -> Result<Value, SerializationError> {
        match value {
            LiteralValue::Null => Ok(Value::Null),
            LiteralValue::Bool(b) => Ok(Value::Bool(*b)),
            LiteralValue::Int32(v) => Ok(json!(v)),
            LiteralValue::Int64(v) => Ok(json!(v)),
            LiteralValue::Double(v) => Number::from_f64(*v)
                .map(Value::Number)
                .ok_or_else(|| SerializationError::unsupported("Double (non-finite)")),
            LiteralValue::String(s) => Ok(Value::String(s.clone())),
            LiteralValue::DateTime(dt) => Ok(json!({ "$date": dt.timestamp_millis() })),
            LiteralValue::Uuid(u) => Ok(Value::String(u.to_string())),
            LiteralValue::Array(items) => {
                let element = declared.element_type().unwrap_or_else(TypeRef::object);
                items
                    .iter()
                    .map(|item| self.serialize(item, &element))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            LiteralValue::Type(_) | LiteralValue::Queryable(_) => {
                Err(SerializationError::unsupported(value.kind_name()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::QueryableHandle;
    use chrono::{TimeZone, Utc};

    fn serialize(value: LiteralValue) -> Result<Value, SerializationError> {
        let ty = value.natural_type();
        JsonSerializer.serialize(&value, &ty)
    }

    #[test]
    fn test_scalars() {
        assert_eq!(serialize(LiteralValue::from(3)).unwrap(), json!(3));
        assert_eq!(serialize(LiteralValue::from("x")).unwrap(), json!("x"));
        assert_eq!(serialize(LiteralValue::Null).unwrap(), Value::Null);
        assert_eq!(serialize(LiteralValue::from(1.5)).unwrap(), json!(1.5));
    }

    #[test]
    fn test_date_uses_extended_json() {
        let dt = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            serialize(LiteralValue::from(dt)).unwrap(),
            json!({ "$date": 1577836800000i64 })
        );
    }

    #[test]
    fn test_arrays_serialize_elementwise() {
        let value = LiteralValue::Array(vec![LiteralValue::from(1), LiteralValue::from(2)]);
        assert_eq!(serialize(value).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_non_finite_double_rejected() {
        assert!(serialize(LiteralValue::from(f64::NAN)).is_err());
    }

    #[test]
    fn test_type_tokens_and_sources_rejected() {
        let err = serialize(LiteralValue::Type(TypeRef::new("C"))).unwrap_err();
        assert_eq!(err.type_name(), "Type");

        let err = serialize(LiteralValue::Queryable(QueryableHandle::new("B", "docs"))).unwrap_err();
        assert_eq!(err.type_name(), "IQueryable");
    }
}
