//! Expression tree nodes
//!
//! A closed set of node kinds. Every consumer matches exhaustively, so adding
//! a kind forces each translator to decide what to do with it.

use std::fmt;

use super::literal::LiteralValue;

/// Named static type of an expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn boolean() -> Self {
        Self::new("Boolean")
    }

    pub fn int32() -> Self {
        Self::new("Int32")
    }

    pub fn int64() -> Self {
        Self::new("Int64")
    }

    pub fn double() -> Self {
        Self::new("Double")
    }

    pub fn string() -> Self {
        Self::new("String")
    }

    pub fn object() -> Self {
        Self::new("Object")
    }

    /// Type of a `typeof(..)` token or a `GetType()` result
    pub fn type_token() -> Self {
        Self::new("Type")
    }

    /// Array type with this element type
    pub fn array_of(&self) -> Self {
        Self(format!("{}[]", self.0))
    }

    /// Element type if this is an array type
    pub fn element_type(&self) -> Option<TypeRef> {
        self.0.strip_suffix("[]").map(TypeRef::new)
    }

    pub fn is_array(&self) -> bool {
        self.0.ends_with("[]")
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A field or property, identified by declaring type and name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberId {
    pub declaring_type: TypeRef,
    pub name: String,
}

impl MemberId {
    pub fn new(declaring_type: impl Into<TypeRef>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
        }
    }
}

/// A method or constructor, identified by declaring type and name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodId {
    pub declaring_type: TypeRef,
    pub name: String,
}

impl MethodId {
    pub fn new(declaring_type: impl Into<TypeRef>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
        }
    }

    /// Constructor of the given type
    pub fn ctor(declaring_type: impl Into<TypeRef>) -> Self {
        Self::new(declaring_type, ".ctor")
    }

    /// `Object.GetType()`
    pub fn get_type() -> Self {
        Self::new(TypeRef::object(), "GetType")
    }

    pub fn is_get_type(&self) -> bool {
        self.name == "GetType"
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Not,
    Convert,
    ArrayLength,
    Quote,
    TypeAs,
    UnaryPlus,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Negate => "Negate",
            UnaryOp::Not => "Not",
            UnaryOp::Convert => "Convert",
            UnaryOp::ArrayLength => "ArrayLength",
            UnaryOp::Quote => "Quote",
            UnaryOp::TypeAs => "TypeAs",
            UnaryOp::UnaryPlus => "UnaryPlus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    And,
    AndAlso,
    Or,
    OrElse,
    ExclusiveOr,
    LeftShift,
    RightShift,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Coalesce,
    ArrayIndex,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "Add",
            BinaryOp::Subtract => "Subtract",
            BinaryOp::Multiply => "Multiply",
            BinaryOp::Divide => "Divide",
            BinaryOp::Modulo => "Modulo",
            BinaryOp::Power => "Power",
            BinaryOp::And => "And",
            BinaryOp::AndAlso => "AndAlso",
            BinaryOp::Or => "Or",
            BinaryOp::OrElse => "OrElse",
            BinaryOp::ExclusiveOr => "ExclusiveOr",
            BinaryOp::LeftShift => "LeftShift",
            BinaryOp::RightShift => "RightShift",
            BinaryOp::Equal => "Equal",
            BinaryOp::NotEqual => "NotEqual",
            BinaryOp::LessThan => "LessThan",
            BinaryOp::LessThanOrEqual => "LessThanOrEqual",
            BinaryOp::GreaterThan => "GreaterThan",
            BinaryOp::GreaterThanOrEqual => "GreaterThanOrEqual",
            BinaryOp::Coalesce => "Coalesce",
            BinaryOp::ArrayIndex => "ArrayIndex",
        }
    }

    /// Returns true for the six ordering/equality comparisons
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
        )
    }

    /// Comparison with its operands swapped (`a < b` is `b > a`)
    pub fn mirrored(&self) -> Self {
        match self {
            BinaryOp::LessThan => BinaryOp::GreaterThan,
            BinaryOp::LessThanOrEqual => BinaryOp::GreaterThanOrEqual,
            BinaryOp::GreaterThan => BinaryOp::LessThan,
            BinaryOp::GreaterThanOrEqual => BinaryOp::LessThanOrEqual,
            other => *other,
        }
    }
}

/// Reduction over a sub-collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Count,
    Sum,
    Average,
    Min,
    Max,
}

/// A named, typed variable (lambda parameter or free reference)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub name: String,
    pub ty: TypeRef,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// Expression node referencing this variable
    pub fn to_node(&self) -> ExpressionNode {
        ExpressionNode::new(NodeKind::Variable(self.clone()), self.ty.clone())
    }
}

/// One `Add(..)` call of a collection initializer
#[derive(Debug, Clone, PartialEq)]
pub struct ElementInit {
    pub add_method: MethodId,
    pub args: Vec<ExpressionNode>,
}

/// One member assignment inside an object initializer
#[derive(Debug, Clone, PartialEq)]
pub enum MemberBinding {
    /// `Member = expression`
    Assignment {
        member: MemberId,
        expression: ExpressionNode,
    },
    /// `Member = { Nested = .. }`
    MemberBinding {
        member: MemberId,
        bindings: Vec<MemberBinding>,
    },
    /// `Member = { a, b }`
    ListBinding {
        member: MemberId,
        initializers: Vec<ElementInit>,
    },
}

impl MemberBinding {
    pub fn member(&self) -> &MemberId {
        match self {
            MemberBinding::Assignment { member, .. }
            | MemberBinding::MemberBinding { member, .. }
            | MemberBinding::ListBinding { member, .. } => member,
        }
    }
}

/// The tagged union of expression node kinds
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Unary {
        op: UnaryOp,
        operand: Box<ExpressionNode>,
    },
    Binary {
        op: BinaryOp,
        left: Box<ExpressionNode>,
        right: Box<ExpressionNode>,
    },
    TypeTest {
        operand: Box<ExpressionNode>,
        candidate: TypeRef,
    },
    Conditional {
        test: Box<ExpressionNode>,
        if_true: Box<ExpressionNode>,
        if_false: Box<ExpressionNode>,
    },
    Literal(LiteralValue),
    Variable(Variable),
    /// `target.member`; `target` is `None` for static members
    MemberAccess {
        target: Option<Box<ExpressionNode>>,
        member: MemberId,
    },
    /// `target.method(args)`; `target` is `None` for static methods
    Call {
        target: Option<Box<ExpressionNode>>,
        method: MethodId,
        args: Vec<ExpressionNode>,
    },
    New {
        ctor: MethodId,
        args: Vec<ExpressionNode>,
        members: Option<Vec<MemberId>>,
    },
    ArrayLiteral {
        elements: Vec<ExpressionNode>,
    },
    Invoke {
        callee: Box<ExpressionNode>,
        args: Vec<ExpressionNode>,
    },
    MemberInit {
        new: Box<ExpressionNode>,
        bindings: Vec<MemberBinding>,
    },
    ListInit {
        new: Box<ExpressionNode>,
        initializers: Vec<ElementInit>,
    },
    Lambda {
        params: Vec<Variable>,
        body: Box<ExpressionNode>,
    },
    /// Reference to a resolved storage field
    FieldRef {
        source: Box<ExpressionNode>,
        field_name: String,
        is_projected: bool,
    },
    /// Reduction such as count/sum over a sub-collection
    Aggregate {
        kind: AggregateKind,
        argument: Box<ExpressionNode>,
    },
}

impl NodeKind {
    /// Stable variant tag, used in error messages
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Unary { .. } => "Unary",
            NodeKind::Binary { .. } => "Binary",
            NodeKind::TypeTest { .. } => "TypeTest",
            NodeKind::Conditional { .. } => "Conditional",
            NodeKind::Literal(_) => "Literal",
            NodeKind::Variable(_) => "Variable",
            NodeKind::MemberAccess { .. } => "MemberAccess",
            NodeKind::Call { .. } => "Call",
            NodeKind::New { .. } => "New",
            NodeKind::ArrayLiteral { .. } => "ArrayLiteral",
            NodeKind::Invoke { .. } => "Invoke",
            NodeKind::MemberInit { .. } => "MemberInit",
            NodeKind::ListInit { .. } => "ListInit",
            NodeKind::Lambda { .. } => "Lambda",
            NodeKind::FieldRef { .. } => "FieldRef",
            NodeKind::Aggregate { .. } => "Aggregate",
        }
    }
}

/// An expression node with its static result type
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionNode {
    pub kind: NodeKind,
    pub ty: TypeRef,
}

impl ExpressionNode {
    pub fn new(kind: NodeKind, ty: impl Into<TypeRef>) -> Self {
        Self {
            kind,
            ty: ty.into(),
        }
    }

    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    /// Literal with its natural type
    pub fn literal(value: impl Into<LiteralValue>) -> Self {
        let value = value.into();
        let ty = value.natural_type();
        Self::new(NodeKind::Literal(value), ty)
    }

    /// Literal with an explicit declared type
    pub fn typed_literal(value: impl Into<LiteralValue>, ty: impl Into<TypeRef>) -> Self {
        Self::new(NodeKind::Literal(value.into()), ty)
    }

    /// `typeof(ty)`
    pub fn type_token(ty: impl Into<TypeRef>) -> Self {
        Self::new(
            NodeKind::Literal(LiteralValue::Type(ty.into())),
            TypeRef::type_token(),
        )
    }

    pub fn variable(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Variable::new(name, ty).to_node()
    }

    /// `target.name` where the member is declared on `target`'s type
    pub fn member(target: ExpressionNode, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        let member = MemberId::new(target.ty.clone(), name);
        Self::new(
            NodeKind::MemberAccess {
                target: Some(Box::new(target)),
                member,
            },
            ty,
        )
    }

    pub fn unary(op: UnaryOp, operand: ExpressionNode, ty: impl Into<TypeRef>) -> Self {
        Self::new(
            NodeKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
        )
    }

    pub fn not(operand: ExpressionNode) -> Self {
        Self::unary(UnaryOp::Not, operand, TypeRef::boolean())
    }

    /// `(ty) operand`
    pub fn convert(operand: ExpressionNode, ty: impl Into<TypeRef>) -> Self {
        Self::unary(UnaryOp::Convert, operand, ty)
    }

    /// Binary node; comparisons and logical connectives are boolean, other
    /// operators take the left operand's type.
    pub fn binary(op: BinaryOp, left: ExpressionNode, right: ExpressionNode) -> Self {
        let ty = match op {
            op if op.is_comparison() => TypeRef::boolean(),
            BinaryOp::AndAlso | BinaryOp::OrElse => TypeRef::boolean(),
            BinaryOp::ArrayIndex => left.ty.element_type().unwrap_or_else(TypeRef::object),
            _ => left.ty.clone(),
        };
        Self::new(
            NodeKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
        )
    }

    pub fn eq(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::binary(BinaryOp::Equal, left, right)
    }

    pub fn gt(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::binary(BinaryOp::GreaterThan, left, right)
    }

    pub fn lt(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::binary(BinaryOp::LessThan, left, right)
    }

    pub fn and_also(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::binary(BinaryOp::AndAlso, left, right)
    }

    pub fn or_else(left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::binary(BinaryOp::OrElse, left, right)
    }

    /// `operand is candidate`
    pub fn type_test(operand: ExpressionNode, candidate: impl Into<TypeRef>) -> Self {
        Self::new(
            NodeKind::TypeTest {
                operand: Box::new(operand),
                candidate: candidate.into(),
            },
            TypeRef::boolean(),
        )
    }

    /// `operand.GetType()`
    pub fn get_type(operand: ExpressionNode) -> Self {
        Self::call(Some(operand), MethodId::get_type(), Vec::new(), TypeRef::type_token())
    }

    pub fn conditional(test: ExpressionNode, if_true: ExpressionNode, if_false: ExpressionNode) -> Self {
        let ty = if_true.ty.clone();
        Self::new(
            NodeKind::Conditional {
                test: Box::new(test),
                if_true: Box::new(if_true),
                if_false: Box::new(if_false),
            },
            ty,
        )
    }

    pub fn call(
        target: Option<ExpressionNode>,
        method: MethodId,
        args: Vec<ExpressionNode>,
        ty: impl Into<TypeRef>,
    ) -> Self {
        Self::new(
            NodeKind::Call {
                target: target.map(Box::new),
                method,
                args,
            },
            ty,
        )
    }

    pub fn new_object(
        ty: impl Into<TypeRef>,
        args: Vec<ExpressionNode>,
        members: Option<Vec<MemberId>>,
    ) -> Self {
        let ty = ty.into();
        Self::new(
            NodeKind::New {
                ctor: MethodId::ctor(ty.clone()),
                args,
                members,
            },
            ty,
        )
    }

    pub fn array(elements: Vec<ExpressionNode>, element_type: impl Into<TypeRef>) -> Self {
        let ty = element_type.into().array_of();
        Self::new(NodeKind::ArrayLiteral { elements }, ty)
    }

    pub fn invoke(callee: ExpressionNode, args: Vec<ExpressionNode>, ty: impl Into<TypeRef>) -> Self {
        Self::new(
            NodeKind::Invoke {
                callee: Box::new(callee),
                args,
            },
            ty,
        )
    }

    pub fn member_init(new: ExpressionNode, bindings: Vec<MemberBinding>) -> Self {
        let ty = new.ty.clone();
        Self::new(
            NodeKind::MemberInit {
                new: Box::new(new),
                bindings,
            },
            ty,
        )
    }

    pub fn list_init(new: ExpressionNode, initializers: Vec<ElementInit>) -> Self {
        let ty = new.ty.clone();
        Self::new(
            NodeKind::ListInit {
                new: Box::new(new),
                initializers,
            },
            ty,
        )
    }

    /// Lambda whose type is rendered as `Func<P1, .., R>`
    pub fn lambda(params: Vec<Variable>, body: ExpressionNode) -> Self {
        let mut signature: Vec<&str> = params.iter().map(|p| p.ty.name()).collect();
        signature.push(body.ty.name());
        let ty = TypeRef::new(format!("Func<{}>", signature.join(", ")));
        Self::new(
            NodeKind::Lambda {
                params,
                body: Box::new(body),
            },
            ty,
        )
    }

    pub fn field_ref(
        source: ExpressionNode,
        field_name: impl Into<String>,
        is_projected: bool,
        ty: impl Into<TypeRef>,
    ) -> Self {
        Self::new(
            NodeKind::FieldRef {
                source: Box::new(source),
                field_name: field_name.into(),
                is_projected,
            },
            ty,
        )
    }

    pub fn aggregate(kind: AggregateKind, argument: ExpressionNode, ty: impl Into<TypeRef>) -> Self {
        Self::new(
            NodeKind::Aggregate {
                kind,
                argument: Box::new(argument),
            },
            ty,
        )
    }

    /// Parameters and body if this node is a lambda
    pub fn as_lambda(&self) -> Option<(&[Variable], &ExpressionNode)> {
        match &self.kind {
            NodeKind::Lambda { params, body } => Some((params, body)),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&LiteralValue> {
        match &self.kind {
            NodeKind::Literal(value) => Some(value),
            _ => None,
        }
    }
}
