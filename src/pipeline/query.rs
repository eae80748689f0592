//! Translated query

use std::fmt;

use crate::executor::ExecutionRequest;
use crate::expression::TypeRef;
use crate::translator::QueryDocument;

/// How executed results are materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultShape {
    /// Every matching document
    #[default]
    Sequence,
    First { or_default: bool },
    Single { or_default: bool },
    Any,
    Count,
    ElementAt { or_default: bool },
}

impl ResultShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultShape::Sequence => "sequence",
            ResultShape::First { .. } => "first",
            ResultShape::Single { .. } => "single",
            ResultShape::Any => "any",
            ResultShape::Count => "count",
            ResultShape::ElementAt { .. } => "element_at",
        }
    }
}

/// Output of translating a pipeline: one find against one collection
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedQuery {
    pub collection: String,
    /// Type the collection stores
    pub document_type: TypeRef,
    /// Element type after the last stage
    pub element_type: TypeRef,
    pub query: QueryDocument,
    pub projection: Option<QueryDocument>,
    pub sort: Option<QueryDocument>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub result: ResultShape,
}

impl TranslatedQuery {
    /// Request handed to an executor
    pub fn to_request(&self) -> ExecutionRequest {
        ExecutionRequest {
            query: self.query.clone(),
            projection: self.projection.clone(),
            sort: self.sort.clone(),
            skip: self.skip,
            limit: self.limit,
        }
    }
}

impl fmt::Display for TranslatedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.find({}", self.collection, self.query)?;
        if let Some(projection) = &self.projection {
            write!(f, ", {}", projection)?;
        }
        write!(f, ")")?;
        if let Some(sort) = &self.sort {
            write!(f, ".sort({})", sort)?;
        }
        if let Some(skip) = self.skip {
            write!(f, ".skip({})", skip)?;
        }
        if let Some(limit) = self.limit {
            write!(f, ".limit({})", limit)?;
        }
        Ok(())
    }
}
