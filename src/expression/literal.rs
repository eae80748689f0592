//! Literal operands carried by expression trees

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::node::TypeRef;

/// Handle to a queryable source collection embedded in an expression.
///
/// Two handles with the same element type stand for "some source of that
/// type" and compare as equivalent regardless of which collection they name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryableHandle {
    /// Element type of the sequence
    pub element_type: TypeRef,
    /// Collection the handle reads from
    pub source: String,
}

impl QueryableHandle {
    pub fn new(element_type: impl Into<TypeRef>, source: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            source: source.into(),
        }
    }
}

/// Constant value embedded in an expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
    Array(Vec<LiteralValue>),
    /// A type token, e.g. the right-hand side of `x.GetType() == typeof(C)`
    Type(TypeRef),
    /// A source collection handle
    Queryable(QueryableHandle),
}

impl LiteralValue {
    /// Static type a literal of this value carries when none is given.
    pub fn natural_type(&self) -> TypeRef {
        match self {
            LiteralValue::Null => TypeRef::object(),
            LiteralValue::Bool(_) => TypeRef::boolean(),
            LiteralValue::Int32(_) => TypeRef::int32(),
            LiteralValue::Int64(_) => TypeRef::int64(),
            LiteralValue::Double(_) => TypeRef::double(),
            LiteralValue::String(_) => TypeRef::string(),
            LiteralValue::DateTime(_) => TypeRef::new("DateTime"),
            LiteralValue::Uuid(_) => TypeRef::new("Guid"),
            LiteralValue::Array(items) => {
                let element = items
                    .first()
                    .map(LiteralValue::natural_type)
                    .unwrap_or_else(TypeRef::object);
                element.array_of()
            }
            LiteralValue::Type(_) => TypeRef::type_token(),
            LiteralValue::Queryable(handle) => {
                TypeRef::new(format!("IQueryable<{}>", handle.element_type))
            }
        }
    }

    /// Name of the value kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            LiteralValue::Null => "Null",
            LiteralValue::Bool(_) => "Boolean",
            LiteralValue::Int32(_) => "Int32",
            LiteralValue::Int64(_) => "Int64",
            LiteralValue::Double(_) => "Double",
            LiteralValue::String(_) => "String",
            LiteralValue::DateTime(_) => "DateTime",
            LiteralValue::Uuid(_) => "Guid",
            LiteralValue::Array(_) => "Array",
            LiteralValue::Type(_) => "Type",
            LiteralValue::Queryable(_) => "IQueryable",
        }
    }

    pub fn as_type(&self) -> Option<&TypeRef> {
        match self {
            LiteralValue::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            LiteralValue::Int32(v) => Some(i64::from(*v)),
            LiteralValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Null => write!(f, "null"),
            LiteralValue::Bool(b) => write!(f, "{}", b),
            LiteralValue::Int32(v) => write!(f, "{}", v),
            LiteralValue::Int64(v) => write!(f, "{}L", v),
            LiteralValue::Double(v) => write!(f, "{}", v),
            LiteralValue::String(s) => write!(f, "{:?}", s),
            LiteralValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            LiteralValue::Uuid(u) => write!(f, "{}", u),
            LiteralValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            LiteralValue::Type(ty) => write!(f, "typeof({})", ty),
            LiteralValue::Queryable(handle) => {
                write!(f, "{}<{}>", handle.source, handle.element_type)
            }
        }
    }
}

impl From<bool> for LiteralValue {
    fn from(v: bool) -> Self {
        LiteralValue::Bool(v)
    }
}

impl From<i32> for LiteralValue {
    fn from(v: i32) -> Self {
        LiteralValue::Int32(v)
    }
}

impl From<i64> for LiteralValue {
    fn from(v: i64) -> Self {
        LiteralValue::Int64(v)
    }
}

impl From<f64> for LiteralValue {
    fn from(v: f64) -> Self {
        LiteralValue::Double(v)
    }
}

impl From<&str> for LiteralValue {
    fn from(v: &str) -> Self {
        LiteralValue::String(v.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(v: String) -> Self {
        LiteralValue::String(v)
    }
}

impl From<DateTime<Utc>> for LiteralValue {
    fn from(v: DateTime<Utc>) -> Self {
        LiteralValue::DateTime(v)
    }
}

impl From<Uuid> for LiteralValue {
    fn from(v: Uuid) -> Self {
        LiteralValue::Uuid(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_types() {
        assert_eq!(LiteralValue::from(1).natural_type(), TypeRef::int32());
        assert_eq!(LiteralValue::from(1i64).natural_type(), TypeRef::int64());
        assert_eq!(LiteralValue::from("x").natural_type(), TypeRef::string());
        assert_eq!(
            LiteralValue::Array(vec![LiteralValue::from(1)]).natural_type(),
            TypeRef::new("Int32[]")
        );
    }

    #[test]
    fn test_display() {
        let lit = LiteralValue::Type(TypeRef::new("C"));
        assert_eq!(lit.to_string(), "typeof(C)");
        assert_eq!(LiteralValue::from("a").to_string(), "\"a\"");
    }
}
