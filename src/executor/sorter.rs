//! Result sorting
//!
//! Sorts raw documents by a sort document, key by key. The sort is stable.

use std::cmp::Ordering;

use serde_json::Value;

use super::errors::{ExecutorError, ExecutorResult};
use super::filters::{compare_same_kind, lookup};
use crate::translator::{ClauseValue, QueryDocument};

/// Sorts result documents
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts `documents` by `{ field : 1 | -1, .. }`
    pub fn sort(documents: &mut [Value], sort: &QueryDocument) -> ExecutorResult<()> {
        let keys = sort
            .iter()
            .map(|(field, clause)| match clause {
                ClauseValue::Value(Value::Number(n)) if n.as_i64() == Some(1) => Ok((field, false)),
                ClauseValue::Value(Value::Number(n)) if n.as_i64() == Some(-1) => Ok((field, true)),
                _ => Err(ExecutorError::malformed(field, "sort direction must be 1 or -1")),
            })
            .collect::<ExecutorResult<Vec<_>>>()?;

        documents.sort_by(|a, b| {
            for (field, descending) in &keys {
                let ordering = Self::compare_values(sort_value(a, field), sort_value(b, field));
                let ordering = if *descending { ordering.reverse() } else { ordering };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        Ok(())
    }

    /// Compares two JSON values for sorting.
    ///
    /// Ordering rules:
    /// - missing < null < bool < number < string < array < object
    /// - For same types, natural ordering
    fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a_val), Some(b_val)) => {
                let type_order = |v: &Value| -> u8 {
                    match v {
                        Value::Null => 0,
                        Value::Bool(_) => 1,
                        Value::Number(_) => 2,
                        Value::String(_) => 3,
                        Value::Array(_) => 4,
                        Value::Object(_) => 5,
                    }
                };

                type_order(a_val)
                    .cmp(&type_order(b_val))
                    .then_with(|| compare_same_kind(a_val, b_val).unwrap_or(Ordering::Equal))
            }
        }
    }
}

fn sort_value<'v>(document: &'v Value, field: &str) -> Option<&'v Value> {
    lookup(document, field).into_iter().next()
}
