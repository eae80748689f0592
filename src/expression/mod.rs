//! Expression tree model for composed queries
//!
//! Query predicates, projections and ordering keys arrive as expression trees.
//! Trees are immutable once built and owned outright by their parents.
//!
//! # Components
//!
//! - `node`: the closed set of node kinds and their static types
//! - `literal`: constant operands
//! - `comparer`: structural equivalence up to bound-variable renaming

mod comparer;
mod literal;
mod node;

pub use comparer::{equivalent, ExpressionComparer};
pub use literal::{LiteralValue, QueryableHandle};
pub use node::{
    AggregateKind, BinaryOp, ElementInit, ExpressionNode, MemberBinding, MemberId, MethodId,
    NodeKind, TypeRef, UnaryOp, Variable,
};
