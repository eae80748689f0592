//! Operator Support Tests
//!
//! Unsupported operators must be refused when they are appended, before any
//! query reaches an executor.
//!
//! Test Categories:
//! 1. Set operators
//! 2. Unsupported named operators
//! 3. Stage ordering rules
//! 4. Type narrowing outside the hierarchy

use aeroquery::executor::MemoryExecutor;
use aeroquery::expression::{ExpressionNode, QueryableHandle, TypeRef, Variable};
use aeroquery::hierarchy::{TypeDescriptor, TypeRegistry};
use aeroquery::pipeline::{OperatorSupport, Pipeline, QueryOperator};
use aeroquery::{QueryContext, TranslationErrorCode};
use serde_json::json;

fn context() -> QueryContext {
    let registry = TypeRegistry::from_descriptors([
        TypeDescriptor::root("Account"),
        TypeDescriptor::derived("Savings", "Account"),
        TypeDescriptor::root("Invoice"),
    ])
    .unwrap();
    QueryContext::new(registry)
}

fn accounts(ctx: &QueryContext) -> Pipeline {
    ctx.query("accounts", "Account").unwrap()
}

fn executor() -> MemoryExecutor {
    let executor = MemoryExecutor::new();
    executor.insert("accounts", json!({"_id": 1, "_t": "Account", "balance": 10}));
    executor
}

fn balance_selector() -> ExpressionNode {
    let a = Variable::new("a", "Account");
    ExpressionNode::lambda(
        vec![a.clone()],
        ExpressionNode::member(a.to_node(), "balance", TypeRef::int32()),
    )
}

fn positive_balance() -> ExpressionNode {
    let a = Variable::new("a", "Account");
    ExpressionNode::lambda(
        vec![a.clone()],
        ExpressionNode::gt(
            ExpressionNode::member(a.to_node(), "balance", TypeRef::int32()),
            ExpressionNode::literal(0),
        ),
    )
}

// =============================================================================
// 1. Set operators
// =============================================================================

#[test]
fn test_concat_is_rejected_before_execution() {
    let ctx = context();
    let executor = executor();
    let other = QueryableHandle::new("Account", "accounts");

    let err = accounts(&ctx).concat(other).unwrap_err();
    assert_eq!(err.code(), TranslationErrorCode::UnsupportedOperator);
    assert_eq!(err.message(), "The Concat query operator is not supported.");
    assert_eq!(err.subject(), Some("Concat"));
    assert_eq!(executor.executed_count(), 0);
}

#[test]
fn test_every_set_operator_is_rejected() {
    let ctx = context();
    let base = accounts(&ctx);
    let other = || QueryableHandle::new("Account", "archive");

    let errors = [
        base.union(other()).unwrap_err(),
        base.intersect(other()).unwrap_err(),
        base.except(other()).unwrap_err(),
    ];
    let names: Vec<_> = errors.iter().filter_map(|e| e.subject()).collect();
    assert_eq!(names, vec!["Union", "Intersect", "Except"]);
    assert_eq!(ctx.metrics().snapshot().rejections, 3);
}

#[test]
fn test_rejection_leaves_pipeline_usable() {
    let ctx = context();
    let executor = executor();
    let base = accounts(&ctx).filter(positive_balance()).unwrap();
    assert!(base.concat(QueryableHandle::new("Account", "accounts")).is_err());
    assert_eq!(base.to_list(&executor).unwrap().len(), 1);
}

// =============================================================================
// 2. Named operators
// =============================================================================

#[test]
fn test_unsupported_named_operators() {
    let ctx = context();
    let base = accounts(&ctx);
    for operator in [
        QueryOperator::Last,
        QueryOperator::LastOrDefault,
        QueryOperator::Reverse,
        QueryOperator::GroupBy,
        QueryOperator::Join,
        QueryOperator::GroupJoin,
        QueryOperator::SelectMany,
        QueryOperator::Aggregate,
        QueryOperator::Zip,
        QueryOperator::SkipWhile,
        QueryOperator::TakeWhile,
        QueryOperator::DefaultIfEmpty,
        QueryOperator::Sum,
        QueryOperator::Average,
        QueryOperator::Min,
        QueryOperator::Max,
    ] {
        assert!(!OperatorSupport::is_supported(operator));
        let err = base.call(operator, Vec::new()).unwrap_err();
        assert_eq!(
            err.message(),
            format!("The {} query operator is not supported.", operator.as_str())
        );
    }
}

#[test]
fn test_supported_named_operators() {
    let ctx = context();
    let base = accounts(&ctx);
    for operator in OperatorSupport::SUPPORTED {
        let args = if operator.takes_index() {
            vec![ExpressionNode::literal(0)]
        } else {
            Vec::new()
        };
        assert!(base.call(*operator, args).is_ok(), "{} should be accepted", operator);
    }
}

// =============================================================================
// 3. Ordering rules
// =============================================================================

#[test]
fn test_no_stage_after_terminal_operator() {
    let ctx = context();
    let counted = accounts(&ctx).count().unwrap();
    assert!(counted.take(1).is_err());
    assert!(counted.first().is_err());
}

#[test]
fn test_no_filter_or_order_after_projection() {
    let ctx = context();
    let projected = accounts(&ctx).select(balance_selector()).unwrap();
    assert!(projected.filter(positive_balance()).is_err());
    assert!(projected.order_by(balance_selector()).is_err());
    assert!(projected.skip(1).is_ok());
}

#[test]
fn test_then_by_without_order_by() {
    let ctx = context();
    let err = accounts(&ctx).then_by(balance_selector()).unwrap_err();
    assert_eq!(err.subject(), Some("ThenBy"));
}

// =============================================================================
// 4. Type narrowing
// =============================================================================

#[test]
fn test_of_type_from_another_hierarchy() {
    let ctx = context();
    let executor = executor();
    let err = accounts(&ctx).of_type("Invoice").unwrap_err();
    assert_eq!(err.code(), TranslationErrorCode::AmbiguousTypeFilter);
    assert_eq!(err.subject(), Some("Invoice"));
    assert_eq!(executor.executed_count(), 0);
}

#[test]
fn test_of_type_unknown_type() {
    let ctx = context();
    let err = accounts(&ctx).of_type("Checking").unwrap_err();
    assert_eq!(err.code(), TranslationErrorCode::AmbiguousTypeFilter);
}
