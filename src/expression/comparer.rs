//! Structural (alpha-)equivalence of expression trees
//!
//! Two trees are equivalent when their node kinds, static types and
//! variant-specific fields match recursively. Variables bound by a lambda are
//! compared positionally through a chain of scopes rather than by name, so
//! `b => b.x > 0` and `c => c.x > 0` are equivalent.
//!
//! The scope chain lives on the call stack: entering a lambda pushes a frame
//! that borrows its parent, and the frame disappears when the recursive call
//! returns. The comparer itself holds no state and can be shared freely.

use super::literal::LiteralValue;
use super::node::{ElementInit, ExpressionNode, MemberBinding, NodeKind, Variable};

/// Binder scopes, innermost first
#[derive(Debug, Clone, Copy)]
enum Scope<'s> {
    Root,
    Frame {
        left: &'s [Variable],
        right: &'s [Variable],
        parent: &'s Scope<'s>,
    },
}

impl<'s> Scope<'s> {
    /// Frame depth and parameter index binding `var` on one side
    fn binding(&self, var: &Variable, left_side: bool) -> Option<(usize, usize)> {
        let mut current = *self;
        let mut depth = 0;
        loop {
            match current {
                Scope::Root => return None,
                Scope::Frame {
                    left,
                    right,
                    parent,
                } => {
                    let params = if left_side { left } else { right };
                    if let Some(index) = params.iter().position(|p| p == var) {
                        return Some((depth, index));
                    }
                    depth += 1;
                    current = *parent;
                }
            }
        }
    }
}

/// Decides structural equivalence of expression trees
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionComparer;

impl ExpressionComparer {
    pub fn new() -> Self {
        Self
    }

    /// Returns true if `a` and `b` are equivalent up to renaming of bound
    /// variables.
    pub fn equivalent(&self, a: &ExpressionNode, b: &ExpressionNode) -> bool {
        self.compare(a, b, &Scope::Root)
    }

    fn compare(&self, a: &ExpressionNode, b: &ExpressionNode, scope: &Scope<'_>) -> bool {
        if std::ptr::eq(a, b) {
            return true;
        }
        if a.kind.tag() != b.kind.tag() || a.ty != b.ty {
            return false;
        }

        match &a.kind {
            NodeKind::Unary { op, operand } => {
                let NodeKind::Unary {
                    op: other_op,
                    operand: other_operand,
                } = &b.kind
                else {
                    return false;
                };
                op == other_op && self.compare(operand, other_operand, scope)
            }
            NodeKind::Binary { op, left, right } => {
                let NodeKind::Binary {
                    op: other_op,
                    left: other_left,
                    right: other_right,
                } = &b.kind
                else {
                    return false;
                };
                op == other_op
                    && self.compare(left, other_left, scope)
                    && self.compare(right, other_right, scope)
            }
            NodeKind::TypeTest { operand, candidate } => {
                let NodeKind::TypeTest {
                    operand: other_operand,
                    candidate: other_candidate,
                } = &b.kind
                else {
                    return false;
                };
                candidate == other_candidate && self.compare(operand, other_operand, scope)
            }
            NodeKind::Conditional {
                test,
                if_true,
                if_false,
            } => {
                let NodeKind::Conditional {
                    test: other_test,
                    if_true: other_true,
                    if_false: other_false,
                } = &b.kind
                else {
                    return false;
                };
                self.compare(test, other_test, scope)
                    && self.compare(if_true, other_true, scope)
                    && self.compare(if_false, other_false, scope)
            }
            NodeKind::Literal(value) => {
                let NodeKind::Literal(other_value) = &b.kind else {
                    return false;
                };
                Self::compare_literal(value, other_value)
            }
            NodeKind::Variable(var) => {
                let NodeKind::Variable(other_var) = &b.kind else {
                    return false;
                };
                Self::compare_variable(var, other_var, scope)
            }
            NodeKind::MemberAccess { target, member } => {
                let NodeKind::MemberAccess {
                    target: other_target,
                    member: other_member,
                } = &b.kind
                else {
                    return false;
                };
                member == other_member
                    && self.compare_optional(target.as_deref(), other_target.as_deref(), scope)
            }
            NodeKind::Call {
                target,
                method,
                args,
            } => {
                let NodeKind::Call {
                    target: other_target,
                    method: other_method,
                    args: other_args,
                } = &b.kind
                else {
                    return false;
                };
                method == other_method
                    && self.compare_optional(target.as_deref(), other_target.as_deref(), scope)
                    && self.compare_list(args, other_args, scope)
            }
            NodeKind::New {
                ctor,
                args,
                members,
            } => {
                let NodeKind::New {
                    ctor: other_ctor,
                    args: other_args,
                    members: other_members,
                } = &b.kind
                else {
                    return false;
                };
                ctor == other_ctor
                    && self.compare_list(args, other_args, scope)
                    && members == other_members
            }
            NodeKind::ArrayLiteral { elements } => {
                let NodeKind::ArrayLiteral {
                    elements: other_elements,
                } = &b.kind
                else {
                    return false;
                };
                self.compare_list(elements, other_elements, scope)
            }
            NodeKind::Invoke { callee, args } => {
                let NodeKind::Invoke {
                    callee: other_callee,
                    args: other_args,
                } = &b.kind
                else {
                    return false;
                };
                self.compare(callee, other_callee, scope)
                    && self.compare_list(args, other_args, scope)
            }
            NodeKind::MemberInit { new, bindings } => {
                let NodeKind::MemberInit {
                    new: other_new,
                    bindings: other_bindings,
                } = &b.kind
                else {
                    return false;
                };
                self.compare(new, other_new, scope)
                    && self.compare_bindings(bindings, other_bindings, scope)
            }
            NodeKind::ListInit { new, initializers } => {
                let NodeKind::ListInit {
                    new: other_new,
                    initializers: other_initializers,
                } = &b.kind
                else {
                    return false;
                };
                self.compare(new, other_new, scope)
                    && self.compare_initializers(initializers, other_initializers, scope)
            }
            NodeKind::Lambda { params, body } => {
                let NodeKind::Lambda {
                    params: other_params,
                    body: other_body,
                } = &b.kind
                else {
                    return false;
                };
                self.compare_lambda(params, body, other_params, other_body, scope)
            }
            NodeKind::FieldRef {
                source,
                field_name,
                is_projected,
            } => {
                let NodeKind::FieldRef {
                    source: other_source,
                    field_name: other_field,
                    is_projected: other_projected,
                } = &b.kind
                else {
                    return false;
                };
                is_projected == other_projected
                    && field_name == other_field
                    && self.compare(source, other_source, scope)
            }
            NodeKind::Aggregate { kind, argument } => {
                let NodeKind::Aggregate {
                    kind: other_kind,
                    argument: other_argument,
                } = &b.kind
                else {
                    return false;
                };
                kind == other_kind && self.compare(argument, other_argument, scope)
            }
        }
    }

    fn compare_literal(a: &LiteralValue, b: &LiteralValue) -> bool {
        if std::ptr::eq(a, b) {
            return true;
        }
        match (a, b) {
            // Source collections of the same element type are placeholders
            (LiteralValue::Queryable(x), LiteralValue::Queryable(y)) => {
                x.element_type == y.element_type
            }
            _ => a == b,
        }
    }

    /// Bound variables match by binder position, free ones by name and type
    fn compare_variable(a: &Variable, b: &Variable, scope: &Scope<'_>) -> bool {
        match (scope.binding(a, true), scope.binding(b, false)) {
            (Some(left), Some(right)) => left == right,
            (None, None) => a.ty == b.ty && a.name == b.name,
            _ => false,
        }
    }

    fn compare_lambda(
        &self,
        params: &[Variable],
        body: &ExpressionNode,
        other_params: &[Variable],
        other_body: &ExpressionNode,
        scope: &Scope<'_>,
    ) -> bool {
        if params.len() != other_params.len() {
            return false;
        }
        if params.iter().zip(other_params).any(|(p, q)| p.ty != q.ty) {
            return false;
        }
        let frame = Scope::Frame {
            left: params,
            right: other_params,
            parent: scope,
        };
        self.compare(body, other_body, &frame)
    }

    fn compare_optional(
        &self,
        a: Option<&ExpressionNode>,
        b: Option<&ExpressionNode>,
        scope: &Scope<'_>,
    ) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.compare(a, b, scope),
            _ => false,
        }
    }

    fn compare_list(&self, a: &[ExpressionNode], b: &[ExpressionNode], scope: &Scope<'_>) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.compare(x, y, scope))
    }

    fn compare_bindings(&self, a: &[MemberBinding], b: &[MemberBinding], scope: &Scope<'_>) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.compare_binding(x, y, scope))
    }

    fn compare_binding(&self, a: &MemberBinding, b: &MemberBinding, scope: &Scope<'_>) -> bool {
        if a.member() != b.member() {
            return false;
        }
        match (a, b) {
            (
                MemberBinding::Assignment { expression, .. },
                MemberBinding::Assignment {
                    expression: other, ..
                },
            ) => self.compare(expression, other, scope),
            (
                MemberBinding::MemberBinding { bindings, .. },
                MemberBinding::MemberBinding {
                    bindings: other, ..
                },
            ) => self.compare_bindings(bindings, other, scope),
            (
                MemberBinding::ListBinding { initializers, .. },
                MemberBinding::ListBinding {
                    initializers: other,
                    ..
                },
            ) => self.compare_initializers(initializers, other, scope),
            // binding kinds differ
            _ => false,
        }
    }

    fn compare_initializers(&self, a: &[ElementInit], b: &[ElementInit], scope: &Scope<'_>) -> bool {
        a.len() == b.len()
            && a.iter().zip(b).all(|(x, y)| {
                x.add_method == y.add_method && self.compare_list(&x.args, &y.args, scope)
            })
    }
}

/// Shorthand for [`ExpressionComparer::equivalent`]
pub fn equivalent(a: &ExpressionNode, b: &ExpressionNode) -> bool {
    ExpressionComparer.equivalent(a, b)
}
