//! Projection and sort translation

use std::fmt;

use serde_json::json;

use super::document::{ClauseValue, QueryDocument};
use super::errors::{TranslationError, TranslationResult};
use super::predicate::field_path;
use crate::expression::{ExpressionNode, MemberBinding, NodeKind, UnaryOp, Variable};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Value used in a sort document
    pub fn value(&self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ordering key: a key-selector lambda and a direction
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub selector: ExpressionNode,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(selector: ExpressionNode) -> Self {
        Self {
            selector,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(selector: ExpressionNode) -> Self {
        Self {
            selector,
            direction: SortDirection::Desc,
        }
    }
}

/// Translates projection and key-selector lambdas
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionTranslator;

impl ProjectionTranslator {
    pub fn new() -> Self {
        Self
    }

    /// Inclusion document for `x => ..`, or `None` when the whole document
    /// is selected
    pub fn translate_projection(&self, lambda: &ExpressionNode) -> TranslationResult<Option<QueryDocument>> {
        let (param, body) = single_parameter(lambda, "projection")?;

        let mut fields = Vec::new();
        if !collect_fields(body, param, &mut fields)? {
            return Ok(None);
        }

        let mut document = QueryDocument::new();
        for field in fields {
            if document.get(&field).is_none() {
                document.push(field, ClauseValue::Value(json!(1)));
            }
        }
        Ok(Some(document))
    }

    /// `{ field : 1 | -1, .. }` in key order
    pub fn translate_sort(&self, keys: &[SortKey]) -> TranslationResult<QueryDocument> {
        let mut document = QueryDocument::new();
        for key in keys {
            let (param, body) = single_parameter(&key.selector, "sort key")?;
            let path = field_path(body, param)?;
            document.push(path, ClauseValue::Value(json!(key.direction.value())));
        }
        Ok(document)
    }
}

fn single_parameter<'n>(
    lambda: &'n ExpressionNode,
    role: &str,
) -> TranslationResult<(&'n Variable, &'n ExpressionNode)> {
    match lambda.as_lambda() {
        Some(([param], body)) => Ok((param, body)),
        Some((params, _)) => Err(TranslationError::unsupported_expression(
            "Lambda",
            format!("a {} takes one parameter, found {}", role, params.len()),
        )),
        None => Err(TranslationError::unsupported_expression(
            lambda.tag(),
            format!("a {} must be a lambda", role),
        )),
    }
}

/// Appends the field paths `node` reads. Returns false when `node` selects
/// the whole document.
fn collect_fields(node: &ExpressionNode, param: &Variable, out: &mut Vec<String>) -> TranslationResult<bool> {
    match &node.kind {
        NodeKind::Variable(v) if v == param => Ok(false),
        NodeKind::Unary {
            op: UnaryOp::Convert | UnaryOp::TypeAs,
            operand,
        } => collect_fields(operand, param, out),
        NodeKind::MemberAccess { .. } | NodeKind::FieldRef { .. } | NodeKind::Binary { .. } => {
            out.push(field_path(node, param)?);
            Ok(true)
        }
        NodeKind::New { args, .. } => collect_all(args, param, out),
        NodeKind::MemberInit { new, bindings } => {
            let mut partial = collect_fields(new, param, out)?;
            for binding in bindings {
                match binding {
                    MemberBinding::Assignment { expression, .. } => {
                        partial &= collect_fields(expression, param, out)?;
                    }
                    MemberBinding::MemberBinding { member, .. } | MemberBinding::ListBinding { member, .. } => {
                        return Err(TranslationError::unsupported_expression(
                            "MemberInit",
                            format!("nested initializer for {} in a projection", member.name),
                        ))
                    }
                }
            }
            Ok(partial)
        }
        NodeKind::Unary { .. }
        | NodeKind::TypeTest { .. }
        | NodeKind::Conditional { .. }
        | NodeKind::Literal(_)
        | NodeKind::Variable(_)
        | NodeKind::Call { .. }
        | NodeKind::ArrayLiteral { .. }
        | NodeKind::Invoke { .. }
        | NodeKind::ListInit { .. }
        | NodeKind::Lambda { .. }
        | NodeKind::Aggregate { .. } => Err(TranslationError::unsupported_expression(
            node.tag(),
            "computed projections are not supported",
        )),
    }
}

fn collect_all(args: &[ExpressionNode], param: &Variable, out: &mut Vec<String>) -> TranslationResult<bool> {
    let mut partial = true;
    for arg in args {
        partial &= collect_fields(arg, param, out)?;
    }
    Ok(partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{BinaryOp, MemberId, TypeRef};
    use crate::translator::TranslationErrorCode;

    fn x() -> Variable {
        Variable::new("x", "C")
    }

    fn member(name: &str) -> ExpressionNode {
        ExpressionNode::member(x().to_node(), name, TypeRef::int32())
    }

    #[test]
    fn test_identity_projection() {
        let lambda = ExpressionNode::lambda(vec![x()], x().to_node());
        assert_eq!(ProjectionTranslator::new().translate_projection(&lambda).unwrap(), None);
    }

    #[test]
    fn test_member_projection() {
        let lambda = ExpressionNode::lambda(vec![x()], member("b"));
        let doc = ProjectionTranslator::new().translate_projection(&lambda).unwrap().unwrap();
        assert_eq!(doc.to_string(), r#"{ "b" : 1 }"#);
    }

    #[test]
    fn test_anonymous_type_projection() {
        let new = ExpressionNode::new_object(
            "<>Anon",
            vec![member("b"), member("c"), member("b")],
            Some(vec![
                MemberId::new("<>Anon", "b"),
                MemberId::new("<>Anon", "c"),
                MemberId::new("<>Anon", "b2"),
            ]),
        );
        let lambda = ExpressionNode::lambda(vec![x()], new);
        let doc = ProjectionTranslator::new().translate_projection(&lambda).unwrap().unwrap();
        assert_eq!(doc.to_string(), r#"{ "b" : 1, "c" : 1 }"#);
    }

    #[test]
    fn test_member_init_projection() {
        let init = ExpressionNode::member_init(
            ExpressionNode::new_object("Summary", Vec::new(), None),
            vec![MemberBinding::Assignment {
                member: MemberId::new("Summary", "total"),
                expression: member("d"),
            }],
        );
        let lambda = ExpressionNode::lambda(vec![x()], init);
        let doc = ProjectionTranslator::new().translate_projection(&lambda).unwrap().unwrap();
        assert_eq!(doc.to_string(), r#"{ "d" : 1 }"#);
    }

    #[test]
    fn test_computed_projection_rejected() {
        let sum = ExpressionNode::binary(BinaryOp::Add, member("b"), member("c"));
        let lambda = ExpressionNode::lambda(vec![x()], sum);
        let err = ProjectionTranslator::new().translate_projection(&lambda).unwrap_err();
        assert_eq!(err.code(), TranslationErrorCode::UnsupportedExpression);

        let literal = ExpressionNode::lambda(vec![x()], ExpressionNode::literal(1));
        let err = ProjectionTranslator::new().translate_projection(&literal).unwrap_err();
        assert_eq!(err.subject(), Some("Literal"));
    }

    #[test]
    fn test_sort_document() {
        let keys = vec![
            SortKey::asc(ExpressionNode::lambda(vec![x()], member("b"))),
            SortKey::desc(ExpressionNode::lambda(vec![x()], member("c"))),
        ];
        let doc = ProjectionTranslator::new().translate_sort(&keys).unwrap();
        assert_eq!(doc.to_string(), r#"{ "b" : 1, "c" : -1 }"#);
    }
}
