//! Materialized query results

use serde_json::Value;

use super::boundary::RawDocument;

/// Result of executing a pipeline, shaped by its terminal operator
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Every matching document, in result order
    Documents(Vec<RawDocument>),
    /// One document, or `None` for an `OrDefault` operator with no match
    Document(Option<RawDocument>),
    Count(u64),
    Bool(bool),
}

impl QueryResult {
    pub fn into_documents(self) -> Option<Vec<RawDocument>> {
        match self {
            QueryResult::Documents(documents) => Some(documents),
            _ => None,
        }
    }

    pub fn into_document(self) -> Option<Option<RawDocument>> {
        match self {
            QueryResult::Document(document) => Some(document),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<u64> {
        match self {
            QueryResult::Count(count) => Some(*count),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            QueryResult::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Result rendered as JSON
    pub fn to_json(&self) -> Value {
        match self {
            QueryResult::Documents(documents) => Value::Array(documents.clone()),
            QueryResult::Document(document) => document.clone().unwrap_or(Value::Null),
            QueryResult::Count(count) => Value::from(*count),
            QueryResult::Bool(value) => Value::Bool(*value),
        }
    }
}
