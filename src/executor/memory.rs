//! In-memory executor
//!
//! Holds collections of raw documents and runs query documents against them
//! with server semantics. Execution order:
//!
//! 1. Filter by the query document
//! 2. Sort (if a sort document is given)
//! 3. Skip, then limit
//! 4. Apply the inclusion projection

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use serde_json::{Map, Value};

use super::boundary::{DocumentStream, ExecutionRequest, Executor, RawDocument};
use super::errors::{ExecutorError, ExecutorResult};
use super::filters::{lookup, DocumentMatcher};
use super::sorter::ResultSorter;
use crate::translator::{ClauseValue, QueryDocument};

/// Executor over in-memory collections
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    collections: RwLock<HashMap<String, Vec<RawDocument>>>,
    executed: AtomicU64,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, collection: &str, document: RawDocument) {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    pub fn insert_many(&self, collection: &str, documents: impl IntoIterator<Item = RawDocument>) {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
    }

    /// Number of documents stored in `collection`
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Number of queries this executor has served
    pub fn executed_count(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    fn run(&self, collection: &str, request: &ExecutionRequest) -> ExecutorResult<Vec<RawDocument>> {
        let mut matched = Vec::new();
        {
            let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
            for document in collections.get(collection).into_iter().flatten() {
                if DocumentMatcher::matches(document, &request.query)? {
                    matched.push(document.clone());
                }
            }
        }

        if let Some(sort) = &request.sort {
            ResultSorter::sort(&mut matched, sort)?;
        }

        let skip = to_usize(request.skip.unwrap_or(0));
        let limit = request.limit.map_or(usize::MAX, to_usize);
        let window = matched.into_iter().skip(skip).take(limit);

        match &request.projection {
            Some(projection) => window.map(|doc| project(&doc, projection)).collect(),
            None => Ok(window.collect()),
        }
    }
}

impl Executor for MemoryExecutor {
    fn execute(&self, collection: &str, request: &ExecutionRequest) -> ExecutorResult<DocumentStream> {
        self.executed.fetch_add(1, Ordering::Relaxed);
        let results = self.run(collection, request)?;
        Ok(Box::new(results.into_iter().map(Ok)))
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Copies `_id` and every included path into a new document
fn project(document: &Value, projection: &QueryDocument) -> ExecutorResult<RawDocument> {
    let mut out = Map::new();
    if let Some(id) = document.get("_id") {
        out.insert("_id".to_string(), id.clone());
    }

    for (path, clause) in projection.iter() {
        match clause {
            ClauseValue::Value(Value::Number(n)) if n.as_i64() == Some(1) => {}
            _ => return Err(ExecutorError::malformed(path, "only inclusion projections are supported")),
        }
        if let Some(value) = lookup(document, path).into_iter().next() {
            insert_path(&mut out, path, value.clone());
        }
    }
    Ok(Value::Object(out))
}

fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = child {
                insert_path(map, rest, value);
            }
        }
    }
}
