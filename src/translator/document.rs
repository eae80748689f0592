//! Ordered query documents
//!
//! A query document is an ordered list of `field -> clause` entries. Entry
//! order is the order fragments were appended, and the same field may appear
//! more than once. Rendering preserves both.

use std::fmt::{self, Write};

use serde_json::Value;

/// Reserved field carrying a document's runtime type
pub const DISCRIMINATOR_FIELD: &str = "_t";

/// Ordered `operator -> operand` mapping, e.g. `{ "$gt" : 0 }`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperatorObject {
    entries: Vec<(String, Value)>,
}

impl OperatorObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-operator object
    pub fn single(operator: impl Into<String>, operand: Value) -> Self {
        let mut object = Self::new();
        object.insert(operator, operand);
        object
    }

    /// Sets an operator, replacing its operand if already present
    pub fn insert(&mut self, operator: impl Into<String>, operand: Value) {
        let operator = operator.into();
        match self.entries.iter_mut().find(|(op, _)| *op == operator) {
            Some(entry) => entry.1 = operand,
            None => self.entries.push((operator, operand)),
        }
    }

    /// True when `other` sets an operator `self` already carries
    pub fn overlaps(&self, other: &OperatorObject) -> bool {
        other.entries.iter().any(|(op, _)| self.get(op).is_some())
    }

    /// Merges `other` into `self`; operators from `other` win on conflict
    pub fn merge(&mut self, other: OperatorObject) {
        for (operator, operand) in other.entries {
            self.insert(operator, operand);
        }
    }

    pub fn get(&self, operator: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(op, _)| op == operator)
            .map(|(_, operand)| operand)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(op, operand)| (op.as_str(), operand))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Value stored under a field of a query document
#[derive(Debug, Clone, PartialEq)]
pub enum ClauseValue {
    /// Literal equality
    Value(Value),
    /// Operator object
    Operators(OperatorObject),
    /// Sub-documents of a logical operator (`$or`, `$nor`, `$and`)
    Documents(Vec<QueryDocument>),
}

/// One `(field, clause)` fragment produced by a pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub struct ClauseFragment {
    pub field: String,
    pub clause: ClauseValue,
}

impl ClauseFragment {
    pub fn new(field: impl Into<String>, clause: ClauseValue) -> Self {
        Self {
            field: field.into(),
            clause,
        }
    }

    /// `{ field : value }`
    pub fn equals(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, ClauseValue::Value(value))
    }

    /// `{ field : { operator : operand } }`
    pub fn operator(field: impl Into<String>, operator: impl Into<String>, operand: Value) -> Self {
        Self::new(
            field,
            ClauseValue::Operators(OperatorObject::single(operator, operand)),
        )
    }

    /// `{ operator : [ doc, .. ] }`
    pub fn logical(operator: impl Into<String>, documents: Vec<QueryDocument>) -> Self {
        Self::new(operator, ClauseValue::Documents(documents))
    }
}

/// Ordered query document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryDocument {
    entries: Vec<(String, ClauseValue)>,
}

impl QueryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry without merging
    pub fn push(&mut self, field: impl Into<String>, clause: ClauseValue) {
        self.entries.push((field.into(), clause));
    }

    /// Builder form of [`push`](Self::push) for literal values
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.push(field, ClauseValue::Value(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClauseValue)> {
        self.entries.iter().map(|(field, clause)| (field.as_str(), clause))
    }

    /// Field names in entry order, duplicates included
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(field, _)| field.as_str()).collect()
    }

    /// First clause for `field`
    pub fn get(&self, field: &str) -> Option<&ClauseValue> {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, clause)| clause)
    }

    /// Most recent entry for `field`, mutable
    pub(crate) fn last_mut(&mut self, field: &str) -> Option<&mut ClauseValue> {
        self.entries
            .iter_mut()
            .rev()
            .find(|(f, _)| f == field)
            .map(|(_, clause)| clause)
    }
}

impl fmt::Display for QueryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "{{ }}");
        }
        write!(f, "{{ ")?;
        for (i, (field, clause)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write_string(f, field)?;
            write!(f, " : ")?;
            write_clause(f, clause)?;
        }
        write!(f, " }}")
    }
}

fn write_clause(f: &mut fmt::Formatter<'_>, clause: &ClauseValue) -> fmt::Result {
    match clause {
        ClauseValue::Value(value) => write_value(f, value),
        ClauseValue::Operators(ops) => {
            write!(f, "{{ ")?;
            for (i, (op, operand)) in ops.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_string(f, op)?;
                write!(f, " : ")?;
                write_value(f, operand)?;
            }
            write!(f, " }}")
        }
        ClauseValue::Documents(docs) => {
            write!(f, "[")?;
            for (i, doc) in docs.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", doc)?;
            }
            write!(f, "]")
        }
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Array(items) => {
            write!(f, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_value(f, item)?;
            }
            write!(f, "]")
        }
        Value::Object(map) => {
            if map.is_empty() {
                return write!(f, "{{ }}");
            }
            write!(f, "{{ ")?;
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_string(f, key)?;
                write!(f, " : ")?;
                write_value(f, item)?;
            }
            write!(f, " }}")
        }
        Value::String(s) => write_string(f, s),
        scalar => write!(f, "{}", scalar),
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    // serde_json handles escaping of quotes and control characters
    let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
    f.write_str(&quoted)
}

impl QueryDocument {
    /// Renders the document on one line, same as `Display`
    pub fn to_json(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = write!(out, "{}", self);
        out
    }
}
