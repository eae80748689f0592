//! Predicate translation
//!
//! Walks the body of a single-parameter predicate lambda and produces the
//! ordered clause fragments for it. Field paths are member-access chains (or
//! resolved field references) rooted at the lambda parameter.
//!
//! Any node shape without a rule here fails the whole translation with
//! `UnsupportedExpression` naming the node kind.

use serde_json::{json, Value};

use super::composer::ClauseComposer;
use super::document::{ClauseFragment, QueryDocument};
use super::errors::{TranslationError, TranslationResult};
use super::serializer::Serializer;
use super::type_filter::TypeFilterTranslator;
use crate::expression::{
    AggregateKind, BinaryOp, ExpressionComparer, ExpressionNode, LiteralValue, NodeKind, TypeRef,
    UnaryOp, Variable,
};

/// Translates predicate lambdas into clause fragments
pub struct PredicateTranslator<'a> {
    type_filters: TypeFilterTranslator<'a>,
    serializer: &'a dyn Serializer,
    comparer: ExpressionComparer,
}

impl<'a> PredicateTranslator<'a> {
    pub fn new(type_filters: TypeFilterTranslator<'a>, serializer: &'a dyn Serializer) -> Self {
        Self {
            type_filters,
            serializer,
            comparer: ExpressionComparer::new(),
        }
    }

    /// Translates `x => body` into fragments over the fields of `x`
    pub fn translate_lambda(&self, lambda: &ExpressionNode) -> TranslationResult<Vec<ClauseFragment>> {
        let (params, body) = lambda.as_lambda().ok_or_else(|| {
            TranslationError::unsupported_expression(lambda.tag(), "a predicate must be a lambda")
        })?;
        let [param] = params else {
            return Err(TranslationError::unsupported_expression(
                "Lambda",
                format!("a predicate takes one parameter, found {}", params.len()),
            ));
        };
        self.translate(body, param)
    }

    fn translate(&self, node: &ExpressionNode, param: &Variable) -> TranslationResult<Vec<ClauseFragment>> {
        match &node.kind {
            NodeKind::Binary {
                op: BinaryOp::AndAlso,
                ..
            } => self.translate_and(node, param),
            NodeKind::Binary {
                op: BinaryOp::OrElse,
                ..
            } => self.translate_or(node, param),
            NodeKind::Binary { op, left, right } if op.is_comparison() => {
                self.translate_comparison(*op, left, right, param)
            }
            NodeKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => self.translate_not(operand, param),
            NodeKind::Unary {
                op: UnaryOp::Convert | UnaryOp::Quote,
                operand,
            } if operand.ty == TypeRef::boolean() => self.translate(operand, param),
            NodeKind::TypeTest { operand, candidate } => {
                if !is_parameter(operand, param) {
                    return Err(TranslationError::unsupported_expression(
                        "TypeTest",
                        "only the document itself can be type tested",
                    ));
                }
                self.type_filters.narrow_to_subtree(candidate)
            }
            NodeKind::Call { target, method, args } => {
                self.translate_call(target.as_deref(), &method.declaring_type, &method.name, args, param)
            }
            NodeKind::MemberAccess { .. } | NodeKind::FieldRef { .. } if node.ty == TypeRef::boolean() => {
                let path = field_path(node, param)?;
                Ok(vec![ClauseFragment::equals(path, Value::Bool(true))])
            }
            NodeKind::Literal(LiteralValue::Bool(true)) => Ok(Vec::new()),
            NodeKind::Unary { .. }
            | NodeKind::Binary { .. }
            | NodeKind::Conditional { .. }
            | NodeKind::Literal(_)
            | NodeKind::Variable(_)
            | NodeKind::MemberAccess { .. }
            | NodeKind::New { .. }
            | NodeKind::ArrayLiteral { .. }
            | NodeKind::Invoke { .. }
            | NodeKind::MemberInit { .. }
            | NodeKind::ListInit { .. }
            | NodeKind::Lambda { .. }
            | NodeKind::FieldRef { .. }
            | NodeKind::Aggregate { .. } => Err(TranslationError::unsupported_expression(
                node.tag(),
                "no filter translation for this expression",
            )),
        }
    }

    /// `a && b && ..`: conjunct fragments in order, alpha-equivalent
    /// repeats dropped
    fn translate_and(&self, node: &ExpressionNode, param: &Variable) -> TranslationResult<Vec<ClauseFragment>> {
        let mut conjuncts = Vec::new();
        flatten(node, BinaryOp::AndAlso, &mut conjuncts);

        let mut distinct: Vec<&ExpressionNode> = Vec::with_capacity(conjuncts.len());
        for conjunct in conjuncts {
            if !distinct.iter().any(|seen| self.comparer.equivalent(seen, conjunct)) {
                distinct.push(conjunct);
            }
        }

        let mut fragments = Vec::new();
        for conjunct in distinct {
            fragments.extend(self.translate(conjunct, param)?);
        }
        Ok(fragments)
    }

    fn translate_or(&self, node: &ExpressionNode, param: &Variable) -> TranslationResult<Vec<ClauseFragment>> {
        let mut disjuncts = Vec::new();
        flatten(node, BinaryOp::OrElse, &mut disjuncts);

        let documents = disjuncts
            .into_iter()
            .map(|d| self.subdocument(d, param))
            .collect::<TranslationResult<Vec<_>>>()?;
        Ok(vec![ClauseFragment::logical("$or", documents)])
    }

    fn translate_not(&self, operand: &ExpressionNode, param: &Variable) -> TranslationResult<Vec<ClauseFragment>> {
        if matches!(operand.kind, NodeKind::MemberAccess { .. } | NodeKind::FieldRef { .. })
            && operand.ty == TypeRef::boolean()
        {
            let path = field_path(operand, param)?;
            return Ok(vec![ClauseFragment::equals(path, Value::Bool(false))]);
        }
        Ok(vec![ClauseFragment::logical(
            "$nor",
            vec![self.subdocument(operand, param)?],
        )])
    }

    fn subdocument(&self, node: &ExpressionNode, param: &Variable) -> TranslationResult<QueryDocument> {
        Ok(ClauseComposer::compose(self.translate(node, param)?))
    }

    fn translate_comparison(
        &self,
        op: BinaryOp,
        left: &ExpressionNode,
        right: &ExpressionNode,
        param: &Variable,
    ) -> TranslationResult<Vec<ClauseFragment>> {
        // x.GetType() == typeof(T)
        if let Some(candidate) = type_token(right).filter(|_| is_get_type_of(left, param)) {
            return self.translate_exact_type(op, candidate, right);
        }
        if let Some(candidate) = type_token(left).filter(|_| is_get_type_of(right, param)) {
            return self.translate_exact_type(op, candidate, left);
        }

        // Put the constant on the right
        let (field, constant, op) = match (literal_operand(left), literal_operand(right)) {
            (None, Some(constant)) => (left, constant, op),
            (Some(constant), None) => (right, constant, op.mirrored()),
            _ => {
                return Err(TranslationError::unsupported_expression(
                    "Binary",
                    format!("{} must compare a field with a constant", op.as_str()),
                ))
            }
        };

        if let Some(sized) = size_operand(field) {
            return self.translate_size(op, sized, constant, param);
        }

        let path = field_path(field, param)?;
        let value = self.serialize(constant, &field.ty)?;
        let fragment = match op {
            BinaryOp::Equal => ClauseFragment::equals(path, value),
            BinaryOp::NotEqual => ClauseFragment::operator(path, "$ne", value),
            BinaryOp::LessThan => ClauseFragment::operator(path, "$lt", value),
            BinaryOp::LessThanOrEqual => ClauseFragment::operator(path, "$lte", value),
            BinaryOp::GreaterThan => ClauseFragment::operator(path, "$gt", value),
            BinaryOp::GreaterThanOrEqual => ClauseFragment::operator(path, "$gte", value),
            other => {
                return Err(TranslationError::unsupported_expression(
                    "Binary",
                    format!("{} is not a comparison", other.as_str()),
                ))
            }
        };
        Ok(vec![fragment])
    }

    fn translate_exact_type(
        &self,
        op: BinaryOp,
        candidate: &TypeRef,
        token: &ExpressionNode,
    ) -> TranslationResult<Vec<ClauseFragment>> {
        match op {
            BinaryOp::Equal => self.type_filters.exact_type(candidate),
            BinaryOp::NotEqual => {
                let exact = self.type_filters.exact_type(candidate)?;
                if exact.is_empty() {
                    return Err(TranslationError::unsupported_expression(
                        token.tag(),
                        format!(
                            "excluding exactly {} needs indexed element existence support on the server",
                            candidate.name()
                        ),
                    ));
                }
                Ok(vec![ClauseFragment::logical(
                    "$nor",
                    vec![ClauseComposer::compose(exact)],
                )])
            }
            other => Err(TranslationError::unsupported_expression(
                token.tag(),
                format!("type tokens only support == and !=, found {}", other.as_str()),
            )),
        }
    }

    /// `x.items.Length == n` and friends
    fn translate_size(
        &self,
        op: BinaryOp,
        sized: &ExpressionNode,
        constant: &ExpressionNode,
        param: &Variable,
    ) -> TranslationResult<Vec<ClauseFragment>> {
        let path = field_path(sized, param)?;
        let size = constant
            .as_literal()
            .and_then(LiteralValue::as_i64)
            .ok_or_else(|| {
                TranslationError::unsupported_expression(
                    constant.tag(),
                    "array sizes compare against integer constants",
                )
            })?;
        match op {
            BinaryOp::Equal => Ok(vec![ClauseFragment::operator(path, "$size", json!(size))]),
            BinaryOp::NotEqual => Ok(vec![ClauseFragment::operator(
                path,
                "$not",
                json!({ "$size": size }),
            )]),
            other => Err(TranslationError::unsupported_expression(
                "Binary",
                format!("array sizes only support == and !=, found {}", other.as_str()),
            )),
        }
    }

    fn translate_call(
        &self,
        target: Option<&ExpressionNode>,
        declaring_type: &TypeRef,
        method: &str,
        args: &[ExpressionNode],
        param: &Variable,
    ) -> TranslationResult<Vec<ClauseFragment>> {
        match (target, method, args) {
            // x.name.StartsWith("ab") and friends
            (Some(field), "StartsWith" | "EndsWith" | "Contains", [arg])
                if field.ty == TypeRef::string() =>
            {
                let path = field_path(field, param)?;
                let text = literal_operand(arg)
                    .and_then(|n| n.as_literal())
                    .and_then(LiteralValue::as_str)
                    .ok_or_else(|| {
                        TranslationError::unsupported_expression(
                            arg.tag(),
                            format!("String.{} needs a string constant", method),
                        )
                    })?;
                let escaped = regex::escape(text);
                let pattern = match method {
                    "StartsWith" => format!("^{}", escaped),
                    "EndsWith" => format!("{}$", escaped),
                    _ => escaped,
                };
                Ok(vec![ClauseFragment::operator(path, "$regex", json!(pattern))])
            }
            // x.tags.Contains(v)
            (Some(field), "Contains", [arg]) => self.translate_contains(field, arg, param),
            // Enumerable.Contains(x.tags, v) or Enumerable.Contains(constants, x.field)
            (None, "Contains", [source, arg]) => match literal_operand(source) {
                Some(constants) => {
                    let path = field_path(arg, param)?;
                    let values = self.serialize(constants, &source.ty)?;
                    Ok(vec![ClauseFragment::operator(path, "$in", values)])
                }
                None => self.translate_contains(source, arg, param),
            },
            // x.field.Equals(v)
            (Some(field), "Equals", [arg]) => {
                self.translate_comparison(BinaryOp::Equal, field, arg, param)
            }
            _ => Err(TranslationError::unsupported_expression(
                "Call",
                format!("{}.{} has no filter translation", declaring_type, method),
            )),
        }
    }

    fn translate_contains(
        &self,
        collection: &ExpressionNode,
        item: &ExpressionNode,
        param: &Variable,
    ) -> TranslationResult<Vec<ClauseFragment>> {
        let path = field_path(collection, param)?;
        let constant = literal_operand(item).ok_or_else(|| {
            TranslationError::unsupported_expression(item.tag(), "Contains needs a constant item")
        })?;
        let element = collection.ty.element_type().unwrap_or_else(|| constant.ty.clone());
        let value = self.serialize(constant, &element)?;
        Ok(vec![ClauseFragment::equals(path, value)])
    }

    fn serialize(&self, constant: &ExpressionNode, declared: &TypeRef) -> TranslationResult<Value> {
        let value = constant.as_literal().ok_or_else(|| {
            TranslationError::unsupported_expression(constant.tag(), "expected a constant")
        })?;
        self.serializer
            .serialize(value, declared)
            .map_err(TranslationError::unsupported_value_type)
    }
}

/// Collects the operands of a chain of `op` nodes, left to right
fn flatten<'n>(node: &'n ExpressionNode, op: BinaryOp, out: &mut Vec<&'n ExpressionNode>) {
    match &node.kind {
        NodeKind::Binary { op: found, left, right } if *found == op => {
            flatten(left, op, out);
            flatten(right, op, out);
        }
        _ => out.push(node),
    }
}

/// Strips conversions and casts that do not change the stored value
fn strip_conversions(node: &ExpressionNode) -> &ExpressionNode {
    match &node.kind {
        NodeKind::Unary {
            op: UnaryOp::Convert | UnaryOp::TypeAs | UnaryOp::Quote,
            operand,
        } => strip_conversions(operand),
        _ => node,
    }
}

fn is_parameter(node: &ExpressionNode, param: &Variable) -> bool {
    matches!(&strip_conversions(node).kind, NodeKind::Variable(v) if v == param)
}

/// The literal node behind `node`, looking through conversions
fn literal_operand(node: &ExpressionNode) -> Option<&ExpressionNode> {
    let inner = strip_conversions(node);
    inner.as_literal().map(|_| inner)
}

/// `T` from `typeof(T)`
fn type_token(node: &ExpressionNode) -> Option<&TypeRef> {
    strip_conversions(node).as_literal().and_then(LiteralValue::as_type)
}

/// `x.GetType()` where `x` is the lambda parameter
fn is_get_type_of(node: &ExpressionNode, param: &Variable) -> bool {
    match &strip_conversions(node).kind {
        NodeKind::Call {
            target: Some(target),
            method,
            args,
        } => method.is_get_type() && args.is_empty() && is_parameter(target, param),
        _ => false,
    }
}

/// The array field whose size `node` measures, if it measures one
fn size_operand(node: &ExpressionNode) -> Option<&ExpressionNode> {
    match &strip_conversions(node).kind {
        NodeKind::Unary {
            op: UnaryOp::ArrayLength,
            operand,
        } => Some(operand),
        NodeKind::Aggregate {
            kind: AggregateKind::Count,
            argument,
        } => Some(argument),
        NodeKind::MemberAccess {
            target: Some(target),
            member,
        } if target.ty.is_array() && (member.name == "Length" || member.name == "Count") => Some(target),
        NodeKind::Call {
            target: None,
            method,
            args,
        } if method.name == "Count" && args.len() == 1 => args.first(),
        _ => None,
    }
}

/// Dotted storage path of a field expression rooted at `param`
pub(crate) fn field_path(node: &ExpressionNode, param: &Variable) -> TranslationResult<String> {
    match &node.kind {
        NodeKind::MemberAccess {
            target: Some(target),
            member,
        } => {
            if is_parameter(target, param) {
                Ok(member.name.clone())
            } else {
                Ok(format!("{}.{}", field_path(target, param)?, member.name))
            }
        }
        NodeKind::FieldRef {
            source, field_name, ..
        } => {
            if is_parameter(source, param) {
                Ok(field_name.clone())
            } else {
                Ok(format!("{}.{}", field_path(source, param)?, field_name))
            }
        }
        NodeKind::Unary {
            op: UnaryOp::Convert | UnaryOp::TypeAs,
            operand,
        } => field_path(operand, param),
        NodeKind::Binary {
            op: BinaryOp::ArrayIndex,
            left,
            right,
        } => {
            let index = right
                .as_literal()
                .and_then(LiteralValue::as_i64)
                .filter(|i| *i >= 0)
                .ok_or_else(|| {
                    TranslationError::unsupported_expression(
                        right.tag(),
                        "array indexes must be non-negative integer constants",
                    )
                })?;
            Ok(format!("{}.{}", field_path(left, param)?, index))
        }
        _ => Err(TranslationError::unsupported_expression(
            node.tag(),
            "not a field of the queried document",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerCapabilities;
    use crate::expression::MethodId;
    use crate::hierarchy::{TypeDescriptor, TypeHierarchy, TypeRegistry};
    use crate::observability::TranslationMetrics;
    use crate::translator::serializer::JsonSerializer;
    use crate::translator::TranslationErrorCode;

    struct Fixture {
        hierarchy: TypeHierarchy,
        metrics: TranslationMetrics,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = TypeRegistry::from_descriptors([
                TypeDescriptor::root("B"),
                TypeDescriptor::derived("C", "B"),
                TypeDescriptor::derived("D", "C"),
            ])
            .unwrap();
            Self {
                hierarchy: TypeHierarchy::resolve_for(&registry, "B").unwrap(),
                metrics: TranslationMetrics::new(),
            }
        }

        fn render(&self, lambda: &ExpressionNode) -> TranslationResult<String> {
            self.render_on(ServerCapabilities::default(), lambda)
        }

        fn render_on(&self, capabilities: ServerCapabilities, lambda: &ExpressionNode) -> TranslationResult<String> {
            let filters = TypeFilterTranslator::new(&self.hierarchy, capabilities, &self.metrics);
            let translator = PredicateTranslator::new(filters, &JsonSerializer);
            let fragments = translator.translate_lambda(lambda)?;
            Ok(ClauseComposer::compose(fragments).to_string())
        }
    }

    fn param(ty: &str) -> Variable {
        Variable::new("x", ty)
    }

    fn field(p: &Variable, name: &str, ty: TypeRef) -> ExpressionNode {
        ExpressionNode::member(p.to_node(), name, ty)
    }

    fn predicate(p: Variable, body: ExpressionNode) -> ExpressionNode {
        ExpressionNode::lambda(vec![p], body)
    }

    #[test]
    fn test_comparisons() {
        let f = Fixture::new();
        let p = param("B");
        let b = || field(&p, "b", TypeRef::int32());

        let cases = [
            (ExpressionNode::eq(b(), ExpressionNode::literal(1)), r#"{ "b" : 1 }"#),
            (ExpressionNode::gt(b(), ExpressionNode::literal(0)), r#"{ "b" : { "$gt" : 0 } }"#),
            (ExpressionNode::lt(b(), ExpressionNode::literal(5)), r#"{ "b" : { "$lt" : 5 } }"#),
            (
                ExpressionNode::binary(BinaryOp::NotEqual, b(), ExpressionNode::literal(2)),
                r#"{ "b" : { "$ne" : 2 } }"#,
            ),
            // constant on the left mirrors the operator
            (ExpressionNode::lt(ExpressionNode::literal(0), b()), r#"{ "b" : { "$gt" : 0 } }"#),
        ];
        for (body, expected) in cases {
            assert_eq!(f.render(&predicate(p.clone(), body)).unwrap(), expected);
        }
    }

    #[test]
    fn test_and_merges_range_on_one_field() {
        let f = Fixture::new();
        let p = param("B");
        let b = || field(&p, "b", TypeRef::int32());
        let body = ExpressionNode::and_also(
            ExpressionNode::gt(b(), ExpressionNode::literal(0)),
            ExpressionNode::binary(BinaryOp::LessThanOrEqual, b(), ExpressionNode::literal(9)),
        );
        assert_eq!(
            f.render(&predicate(p.clone(), body)).unwrap(),
            r#"{ "b" : { "$gt" : 0, "$lte" : 9 } }"#
        );
    }

    #[test]
    fn test_and_keeps_both_bounds_with_same_operator() {
        let f = Fixture::new();
        let p = param("B");
        let b = || field(&p, "b", TypeRef::int32());
        let body = ExpressionNode::and_also(
            ExpressionNode::gt(b(), ExpressionNode::literal(60)),
            ExpressionNode::gt(b(), ExpressionNode::literal(30)),
        );
        assert_eq!(
            f.render(&predicate(p.clone(), body)).unwrap(),
            r#"{ "b" : { "$gt" : 60 }, "b" : { "$gt" : 30 } }"#
        );
    }

    #[test]
    fn test_and_drops_equivalent_conjuncts() {
        let f = Fixture::new();
        let p = param("B");
        let gt = || ExpressionNode::gt(field(&p, "b", TypeRef::int32()), ExpressionNode::literal(0));
        let body = ExpressionNode::and_also(gt(), ExpressionNode::and_also(gt(), gt()));
        assert_eq!(f.render(&predicate(p.clone(), body)).unwrap(), r#"{ "b" : { "$gt" : 0 } }"#);
    }

    #[test]
    fn test_or_and_not() {
        let f = Fixture::new();
        let p = param("B");
        let b = || field(&p, "b", TypeRef::int32());
        let body = ExpressionNode::or_else(
            ExpressionNode::eq(b(), ExpressionNode::literal(1)),
            ExpressionNode::not(ExpressionNode::eq(b(), ExpressionNode::literal(2))),
        );
        assert_eq!(
            f.render(&predicate(p.clone(), body)).unwrap(),
            r#"{ "$or" : [{ "b" : 1 }, { "$nor" : [{ "b" : 2 }] }] }"#
        );
    }

    #[test]
    fn test_boolean_members() {
        let f = Fixture::new();
        let p = param("B");
        let flag = || field(&p, "active", TypeRef::boolean());
        assert_eq!(f.render(&predicate(p.clone(), flag())).unwrap(), r#"{ "active" : true }"#);
        assert_eq!(
            f.render(&predicate(p.clone(), ExpressionNode::not(flag()))).unwrap(),
            r#"{ "active" : false }"#
        );
    }

    #[test]
    fn test_nested_paths_and_indexes() {
        let f = Fixture::new();
        let p = param("B");
        let address = field(&p, "address", TypeRef::new("Address"));
        let city = ExpressionNode::member(address, "city", TypeRef::string());
        let body = ExpressionNode::eq(city, ExpressionNode::literal("Oslo"));
        assert_eq!(
            f.render(&predicate(p.clone(), body)).unwrap(),
            r#"{ "address.city" : "Oslo" }"#
        );

        let scores = field(&p, "scores", TypeRef::int32().array_of());
        let first = ExpressionNode::binary(BinaryOp::ArrayIndex, scores, ExpressionNode::literal(0));
        let body = ExpressionNode::gt(first, ExpressionNode::literal(10));
        assert_eq!(
            f.render(&predicate(p.clone(), body)).unwrap(),
            r#"{ "scores.0" : { "$gt" : 10 } }"#
        );
    }

    #[test]
    fn test_string_methods_escape_regex() {
        let f = Fixture::new();
        let p = param("B");
        let call = |method: &str, arg: &str| {
            ExpressionNode::call(
                Some(field(&p, "name", TypeRef::string())),
                MethodId::new(TypeRef::string(), method),
                vec![ExpressionNode::literal(arg)],
                TypeRef::boolean(),
            )
        };
        assert_eq!(
            f.render(&predicate(p.clone(), call("StartsWith", "a.b"))).unwrap(),
            r#"{ "name" : { "$regex" : "^a\\.b" } }"#
        );
        assert_eq!(
            f.render(&predicate(p.clone(), call("EndsWith", "z"))).unwrap(),
            r#"{ "name" : { "$regex" : "z$" } }"#
        );
    }

    #[test]
    fn test_collection_contains_and_in() {
        let f = Fixture::new();
        let p = param("B");
        let tags = field(&p, "tags", TypeRef::string().array_of());
        let contains = ExpressionNode::call(
            Some(tags),
            MethodId::new("List<String>", "Contains"),
            vec![ExpressionNode::literal("red")],
            TypeRef::boolean(),
        );
        assert_eq!(f.render(&predicate(p.clone(), contains)).unwrap(), r#"{ "tags" : "red" }"#);

        let constants = ExpressionNode::typed_literal(
            LiteralValue::Array(vec![LiteralValue::from(1), LiteralValue::from(2)]),
            TypeRef::int32().array_of(),
        );
        let in_list = ExpressionNode::call(
            None,
            MethodId::new("Enumerable", "Contains"),
            vec![constants, field(&p, "b", TypeRef::int32())],
            TypeRef::boolean(),
        );
        assert_eq!(
            f.render(&predicate(p.clone(), in_list)).unwrap(),
            r#"{ "b" : { "$in" : [1, 2] } }"#
        );
    }

    #[test]
    fn test_array_size() {
        let f = Fixture::new();
        let p = param("B");
        let tags = field(&p, "tags", TypeRef::string().array_of());
        let length = ExpressionNode::member(tags, "Length", TypeRef::int32());
        let body = ExpressionNode::eq(length, ExpressionNode::literal(2));
        assert_eq!(
            f.render(&predicate(p.clone(), body)).unwrap(),
            r#"{ "tags" : { "$size" : 2 } }"#
        );

        let tags = field(&p, "tags", TypeRef::string().array_of());
        let count = ExpressionNode::aggregate(AggregateKind::Count, tags, TypeRef::int32());
        let body = ExpressionNode::gt(count, ExpressionNode::literal(2));
        let err = f.render(&predicate(p.clone(), body)).unwrap_err();
        assert_eq!(err.code(), TranslationErrorCode::UnsupportedExpression);
    }

    #[test]
    fn test_type_test_and_get_type() {
        let f = Fixture::new();
        let p = param("B");
        let is_c = ExpressionNode::type_test(p.to_node(), "C");
        assert_eq!(f.render(&predicate(p.clone(), is_c)).unwrap(), r#"{ "_t" : "C" }"#);

        let exact = ExpressionNode::eq(ExpressionNode::get_type(p.to_node()), ExpressionNode::type_token("C"));
        assert_eq!(
            f.render(&predicate(p.clone(), exact)).unwrap(),
            r#"{ "_t" : { "$size" : 2 }, "_t.0" : "B", "_t.1" : "C" }"#
        );

        let not_root = ExpressionNode::binary(
            BinaryOp::NotEqual,
            ExpressionNode::type_token("B"),
            ExpressionNode::get_type(p.to_node()),
        );
        assert_eq!(
            f.render(&predicate(p.clone(), not_root)).unwrap(),
            r#"{ "$nor" : [{ "_t.0" : { "$exists" : false }, "_t" : "B" }] }"#
        );
    }

    #[test]
    fn test_not_root_type_rejected_without_indexed_exists() {
        let f = Fixture::new();
        let p = param("B");
        let capabilities = crate::config::TranslatorConfig::with_server_version(1, 8).capabilities();
        let not_root = ExpressionNode::binary(
            BinaryOp::NotEqual,
            ExpressionNode::get_type(p.to_node()),
            ExpressionNode::type_token("B"),
        );
        let err = f.render_on(capabilities, &predicate(p.clone(), not_root)).unwrap_err();
        assert_eq!(err.code(), TranslationErrorCode::UnsupportedExpression);

        // array discriminators need no server support
        let not_c = ExpressionNode::binary(
            BinaryOp::NotEqual,
            ExpressionNode::get_type(p.to_node()),
            ExpressionNode::type_token("C"),
        );
        assert_eq!(
            f.render_on(capabilities, &predicate(p.clone(), not_c)).unwrap(),
            r#"{ "$nor" : [{ "_t" : { "$size" : 2 }, "_t.0" : "B", "_t.1" : "C" }] }"#
        );
    }

    #[test]
    fn test_unsupported_shapes_name_node_kind() {
        let f = Fixture::new();
        let p = param("B");
        let b = || field(&p, "b", TypeRef::int32());

        let conditional = ExpressionNode::conditional(
            field(&p, "active", TypeRef::boolean()),
            ExpressionNode::literal(true),
            ExpressionNode::literal(false),
        );
        let err = f.render(&predicate(p.clone(), conditional)).unwrap_err();
        assert_eq!(err.code(), TranslationErrorCode::UnsupportedExpression);
        assert_eq!(err.subject(), Some("Conditional"));

        // field compared with field
        let err = f.render(&predicate(p.clone(), ExpressionNode::eq(b(), b()))).unwrap_err();
        assert_eq!(err.subject(), Some("Binary"));

        // outside the hierarchy
        let err = f
            .render(&predicate(p.clone(), ExpressionNode::type_test(p.to_node(), "Zebra")))
            .unwrap_err();
        assert_eq!(err.code(), TranslationErrorCode::AmbiguousTypeFilter);
    }

    #[test]
    fn test_unserializable_constant() {
        let f = Fixture::new();
        let p = param("B");
        let body = ExpressionNode::eq(
            field(&p, "kind", TypeRef::type_token()),
            ExpressionNode::literal(LiteralValue::Queryable(crate::expression::QueryableHandle::new(
                "B", "docs",
            ))),
        );
        let err = f.render(&predicate(p.clone(), body)).unwrap_err();
        assert_eq!(err.code(), TranslationErrorCode::UnsupportedValueType);
    }

    #[test]
    fn test_lambda_arity_checked() {
        let f = Fixture::new();
        let lambda = ExpressionNode::lambda(
            vec![Variable::new("a", "B"), Variable::new("i", "Int32")],
            ExpressionNode::literal(true),
        );
        let err = f.render(&lambda).unwrap_err();
        assert_eq!(err.subject(), Some("Lambda"));
    }
}
