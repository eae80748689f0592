//! The executor boundary
//!
//! A finished query is handed to an [`Executor`] together with its optional
//! projection, sort, skip and limit. The executor returns a lazy stream of
//! raw documents; the engine never looks inside them except to materialize
//! terminal results.

use serde_json::Value;

use super::errors::ExecutorResult;
use crate::translator::QueryDocument;

/// A raw result document
pub type RawDocument = Value;

/// Lazy sequence of raw result documents
pub type DocumentStream = Box<dyn Iterator<Item = ExecutorResult<RawDocument>> + Send>;

/// Everything an executor needs to run one query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionRequest {
    pub query: QueryDocument,
    pub projection: Option<QueryDocument>,
    pub sort: Option<QueryDocument>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl ExecutionRequest {
    pub fn new(query: QueryDocument) -> Self {
        Self {
            query,
            ..Default::default()
        }
    }

    pub fn with_projection(mut self, projection: QueryDocument) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn with_sort(mut self, sort: QueryDocument) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Runs finished query documents against named collections.
///
/// May be called from any thread. Cancellation, retries and transport are
/// the implementation's concern.
pub trait Executor: Send + Sync {
    fn execute(&self, collection: &str, request: &ExecutionRequest) -> ExecutorResult<DocumentStream>;
}
