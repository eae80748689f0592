//! Query document evaluation
//!
//! Evaluates a query document against a raw document the way the database
//! server does:
//!
//! - Dotted paths descend into sub-documents; a numeric segment selects an
//!   array element, and array elements that are documents are searched too
//! - A scalar equality matches an array field containing the scalar
//! - Every entry must match, duplicate keys included

use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use super::errors::{ExecutorError, ExecutorResult};
use crate::translator::{ClauseValue, QueryDocument};

/// Evaluates query documents against raw documents
pub struct DocumentMatcher;

impl DocumentMatcher {
    /// Checks if `document` satisfies every entry of `query`
    pub fn matches(document: &Value, query: &QueryDocument) -> ExecutorResult<bool> {
        for (field, clause) in query.iter() {
            if !Self::matches_entry(document, field, clause)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn matches_entry(document: &Value, field: &str, clause: &ClauseValue) -> ExecutorResult<bool> {
        match clause {
            ClauseValue::Documents(subqueries) => Self::matches_logical(document, field, subqueries),
            ClauseValue::Value(expected) => {
                let candidates = lookup(document, field);
                Ok(candidates.iter().any(|c| eq_match(c, expected)))
            }
            ClauseValue::Operators(operators) => {
                let candidates = lookup(document, field);
                Self::matches_operators(&candidates, operators.iter())
            }
        }
    }

    fn matches_logical(document: &Value, operator: &str, subqueries: &[QueryDocument]) -> ExecutorResult<bool> {
        let mut results = subqueries.iter().map(|q| Self::matches(document, q));
        match operator {
            "$or" => any_ok(&mut results),
            "$and" => all_ok(&mut results),
            "$nor" => any_ok(&mut results).map(|any| !any),
            other => Err(ExecutorError::unknown_operator(other)),
        }
    }

    /// Every `operator : operand` pair must hold for the candidate values
    fn matches_operators<'o>(
        candidates: &[&Value],
        operators: impl IntoIterator<Item = (&'o str, &'o Value)>,
    ) -> ExecutorResult<bool> {
        for (operator, operand) in operators {
            if !Self::matches_operator(candidates, operator, operand)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn matches_operator(candidates: &[&Value], operator: &str, operand: &Value) -> ExecutorResult<bool> {
        let matched = match operator {
            "$eq" => candidates.iter().any(|c| eq_match(c, operand)),
            "$ne" => !candidates.iter().any(|c| eq_match(c, operand)),
            "$gt" => any_ordered(candidates, operand, |o| o == Ordering::Greater),
            "$gte" => any_ordered(candidates, operand, |o| o != Ordering::Less),
            "$lt" => any_ordered(candidates, operand, |o| o == Ordering::Less),
            "$lte" => any_ordered(candidates, operand, |o| o != Ordering::Greater),
            "$in" => {
                let options = as_array(operator, operand)?;
                candidates
                    .iter()
                    .any(|c| options.iter().any(|option| eq_match(c, option)))
            }
            "$nin" => {
                let options = as_array(operator, operand)?;
                !candidates
                    .iter()
                    .any(|c| options.iter().any(|option| eq_match(c, option)))
            }
            "$exists" => {
                let wanted = operand
                    .as_bool()
                    .ok_or_else(|| ExecutorError::malformed(operator, "expects a boolean"))?;
                candidates.is_empty() != wanted
            }
            "$size" => {
                let size = operand
                    .as_u64()
                    .ok_or_else(|| ExecutorError::malformed(operator, "expects a non-negative integer"))?;
                candidates
                    .iter()
                    .any(|c| matches!(c, Value::Array(items) if items.len() as u64 == size))
            }
            "$regex" => {
                let pattern = operand
                    .as_str()
                    .ok_or_else(|| ExecutorError::malformed(operator, "expects a string pattern"))?;
                let regex = Regex::new(pattern)
                    .map_err(|e| ExecutorError::malformed(operator, e.to_string()))?;
                candidates
                    .iter()
                    .flat_map(|c| expand(c))
                    .any(|v| v.as_str().is_some_and(|s| regex.is_match(s)))
            }
            "$not" => {
                let inner = operand
                    .as_object()
                    .ok_or_else(|| ExecutorError::malformed(operator, "expects an operator object"))?;
                !Self::matches_operators(candidates, inner.iter().map(|(k, v)| (k.as_str(), v)))?
            }
            other => return Err(ExecutorError::unknown_operator(other)),
        };
        Ok(matched)
    }
}

fn any_ok(results: &mut dyn Iterator<Item = ExecutorResult<bool>>) -> ExecutorResult<bool> {
    for result in results {
        if result? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn all_ok(results: &mut dyn Iterator<Item = ExecutorResult<bool>>) -> ExecutorResult<bool> {
    for result in results {
        if !result? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn as_array<'v>(operator: &str, operand: &'v Value) -> ExecutorResult<&'v Vec<Value>> {
    operand
        .as_array()
        .ok_or_else(|| ExecutorError::malformed(operator, "expects an array"))
}

/// Values reached by a dotted path
pub(crate) fn lookup<'v>(document: &'v Value, path: &str) -> Vec<&'v Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    descend(document, &segments, &mut out);
    out
}

fn descend<'v>(value: &'v Value, segments: &[&str], out: &mut Vec<&'v Value>) {
    let Some((head, rest)) = segments.split_first() else {
        out.push(value);
        return;
    };
    match value {
        Value::Object(map) => {
            if let Some(child) = map.get(*head) {
                descend(child, rest, out);
            }
        }
        Value::Array(items) => {
            if let Ok(index) = head.parse::<usize>() {
                if let Some(item) = items.get(index) {
                    descend(item, rest, out);
                }
            }
            for item in items.iter().filter(|item| item.is_object()) {
                descend(item, segments, out);
            }
        }
        _ => {}
    }
}

/// The value itself followed by its elements when it is an array
fn expand(value: &Value) -> impl Iterator<Item = &Value> {
    let elements: &[Value] = match value {
        Value::Array(items) => items.as_slice(),
        _ => &[],
    };
    std::iter::once(value).chain(elements.iter())
}

/// Equality, where an array also matches any element equal to `expected`
fn eq_match(actual: &Value, expected: &Value) -> bool {
    expand(actual).any(|v| v == expected)
}

fn any_ordered(candidates: &[&Value], bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    candidates
        .iter()
        .flat_map(|c| expand(c))
        .filter_map(|v| compare_same_kind(v, bound))
        .any(accept)
}

/// Orders two values of the same kind; values of different kinds never
/// compare
pub(crate) fn compare_same_kind(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Object(x), Value::Object(y)) => match (x.get("$date"), y.get("$date")) {
            (Some(x), Some(y)) => compare_same_kind(x, y),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::{ClauseComposer, ClauseFragment};
    use serde_json::json;

    fn query(fragments: Vec<ClauseFragment>) -> QueryDocument {
        ClauseComposer::compose(fragments)
    }

    fn matches(doc: &Value, fragments: Vec<ClauseFragment>) -> bool {
        DocumentMatcher::matches(doc, &query(fragments)).unwrap()
    }

    #[test]
    fn test_equality_match() {
        let doc = json!({"name": "Alice", "age": 30});
        assert!(matches(&doc, vec![ClauseFragment::equals("name", json!("Alice"))]));
        assert!(!matches(&doc, vec![ClauseFragment::equals("name", json!("Bob"))]));
        // no type coercion
        assert!(!matches(&doc, vec![ClauseFragment::equals("age", json!("30"))]));
    }

    #[test]
    fn test_scalar_matches_array_element() {
        let doc = json!({"_t": ["B", "C"]});
        assert!(matches(&doc, vec![ClauseFragment::equals("_t", json!("C"))]));
        assert!(matches(&doc, vec![ClauseFragment::equals("_t", json!(["B", "C"]))]));
        assert!(!matches(&doc, vec![ClauseFragment::equals("_t", json!("D"))]));
    }

    #[test]
    fn test_indexed_paths_and_exists() {
        let array = json!({"_t": ["B", "C"]});
        let scalar = json!({"_t": "B"});
        let not_array = vec![ClauseFragment::operator("_t.0", "$exists", json!(false))];

        assert!(matches(&scalar, not_array.clone()));
        assert!(!matches(&array, not_array));
        assert!(matches(&array, vec![ClauseFragment::equals("_t.1", json!("C"))]));
    }

    #[test]
    fn test_size() {
        let doc = json!({"_t": ["B", "C", "D"]});
        assert!(matches(&doc, vec![ClauseFragment::operator("_t", "$size", json!(3))]));
        assert!(!matches(&doc, vec![ClauseFragment::operator("_t", "$size", json!(2))]));
    }

    #[test]
    fn test_ranges_and_missing_fields() {
        let doc = json!({"age": 25});
        assert!(matches(&doc, vec![ClauseFragment::operator("age", "$gte", json!(25))]));
        assert!(!matches(&doc, vec![ClauseFragment::operator("age", "$gt", json!(25))]));
        assert!(!matches(&doc, vec![ClauseFragment::operator("missing", "$lt", json!(100))]));
        // strings and numbers never compare
        assert!(!matches(&doc, vec![ClauseFragment::operator("age", "$lt", json!("z"))]));
    }

    #[test]
    fn test_nested_and_array_of_documents() {
        let doc = json!({"orders": [{"qty": 1}, {"qty": 7}], "address": {"city": "Oslo"}});
        assert!(matches(&doc, vec![ClauseFragment::operator("orders.qty", "$gt", json!(5))]));
        assert!(matches(&doc, vec![ClauseFragment::equals("address.city", json!("Oslo"))]));
        assert!(matches(&doc, vec![ClauseFragment::equals("orders.1.qty", json!(7))]));
    }

    #[test]
    fn test_duplicate_keys_are_anded() {
        let doc = json!({"_t": ["B", "C"]});
        let both = vec![
            ClauseFragment::equals("_t", json!("B")),
            ClauseFragment::equals("_t", json!("C")),
        ];
        assert!(matches(&doc, both));
        let conflicting = vec![
            ClauseFragment::equals("_t", json!("C")),
            ClauseFragment::equals("_t", json!("D")),
        ];
        assert!(!matches(&doc, conflicting));
    }

    #[test]
    fn test_logical_operators() {
        let doc = json!({"b": 2});
        let one = QueryDocument::new().with("b", json!(1));
        let two = QueryDocument::new().with("b", json!(2));

        assert!(matches(&doc, vec![ClauseFragment::logical("$or", vec![one.clone(), two.clone()])]));
        assert!(!matches(&doc, vec![ClauseFragment::logical("$and", vec![one.clone(), two.clone()])]));
        assert!(matches(&doc, vec![ClauseFragment::logical("$nor", vec![one])]));
        assert!(!matches(&doc, vec![ClauseFragment::logical("$nor", vec![two])]));
    }

    #[test]
    fn test_in_nin_ne_not_regex() {
        let doc = json!({"b": 2, "name": "alpha", "tags": ["x", "y"]});
        assert!(matches(&doc, vec![ClauseFragment::operator("b", "$in", json!([1, 2]))]));
        assert!(matches(&doc, vec![ClauseFragment::operator("b", "$nin", json!([3]))]));
        assert!(matches(&doc, vec![ClauseFragment::operator("b", "$ne", json!(3))]));
        assert!(matches(&doc, vec![ClauseFragment::operator("tags", "$not", json!({"$size": 3}))]));
        assert!(matches(&doc, vec![ClauseFragment::operator("name", "$regex", json!("^al"))]));
        assert!(matches(&doc, vec![ClauseFragment::operator("tags", "$regex", json!("y"))]));
    }

    #[test]
    fn test_unknown_operator_is_an_error() {
        let doc = json!({"b": 1});
        let err = DocumentMatcher::matches(
            &doc,
            &query(vec![ClauseFragment::operator("b", "$where", json!("1"))]),
        )
        .unwrap_err();
        assert_eq!(err.code(), "AERO_EXECUTION_UNKNOWN_OPERATOR");
    }
}
