//! Pipeline stages

use std::fmt;

use crate::expression::{ExpressionComparer, ExpressionNode, QueryableHandle, TypeRef};
use crate::translator::SortKey;

/// Sequence set operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOperator {
    Concat,
    Union,
    Intersect,
    Except,
}

impl SetOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetOperator::Concat => "Concat",
            SetOperator::Union => "Union",
            SetOperator::Intersect => "Intersect",
            SetOperator::Except => "Except",
        }
    }
}

impl fmt::Display for SetOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named query operators appended as `Call` stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOperator {
    First,
    FirstOrDefault,
    Single,
    SingleOrDefault,
    Any,
    Count,
    LongCount,
    ElementAt,
    ElementAtOrDefault,
    Last,
    LastOrDefault,
    Reverse,
    GroupBy,
    Join,
    GroupJoin,
    SelectMany,
    Aggregate,
    Zip,
    SkipWhile,
    TakeWhile,
    DefaultIfEmpty,
    Sum,
    Average,
    Min,
    Max,
}

impl QueryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOperator::First => "First",
            QueryOperator::FirstOrDefault => "FirstOrDefault",
            QueryOperator::Single => "Single",
            QueryOperator::SingleOrDefault => "SingleOrDefault",
            QueryOperator::Any => "Any",
            QueryOperator::Count => "Count",
            QueryOperator::LongCount => "LongCount",
            QueryOperator::ElementAt => "ElementAt",
            QueryOperator::ElementAtOrDefault => "ElementAtOrDefault",
            QueryOperator::Last => "Last",
            QueryOperator::LastOrDefault => "LastOrDefault",
            QueryOperator::Reverse => "Reverse",
            QueryOperator::GroupBy => "GroupBy",
            QueryOperator::Join => "Join",
            QueryOperator::GroupJoin => "GroupJoin",
            QueryOperator::SelectMany => "SelectMany",
            QueryOperator::Aggregate => "Aggregate",
            QueryOperator::Zip => "Zip",
            QueryOperator::SkipWhile => "SkipWhile",
            QueryOperator::TakeWhile => "TakeWhile",
            QueryOperator::DefaultIfEmpty => "DefaultIfEmpty",
            QueryOperator::Sum => "Sum",
            QueryOperator::Average => "Average",
            QueryOperator::Min => "Min",
            QueryOperator::Max => "Max",
        }
    }

    /// Operators that accept an optional predicate lambda
    pub fn accepts_predicate(&self) -> bool {
        matches!(
            self,
            QueryOperator::First
                | QueryOperator::FirstOrDefault
                | QueryOperator::Single
                | QueryOperator::SingleOrDefault
                | QueryOperator::Any
                | QueryOperator::Count
                | QueryOperator::LongCount
        )
    }

    /// Operators that take an element index
    pub fn takes_index(&self) -> bool {
        matches!(self, QueryOperator::ElementAt | QueryOperator::ElementAtOrDefault)
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One appended step of a composed query
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStage {
    /// `Where(x => ..)`
    Filter(ExpressionNode),
    /// `OfType<T>()`
    TypeNarrow(TypeRef),
    /// `Select(x => ..)`
    Project(ExpressionNode),
    Skip(u64),
    Take(u64),
    /// `OrderBy`/`OrderByDescending`, or `ThenBy`/`ThenByDescending` when
    /// `append` is set
    OrderBy { keys: Vec<SortKey>, append: bool },
    SetOp {
        kind: SetOperator,
        other: QueryableHandle,
    },
    Call {
        operator: QueryOperator,
        args: Vec<ExpressionNode>,
    },
}

impl PipelineStage {
    /// Operator name as written in a query
    pub fn kind_name(&self) -> &'static str {
        match self {
            PipelineStage::Filter(_) => "Where",
            PipelineStage::TypeNarrow(_) => "OfType",
            PipelineStage::Project(_) => "Select",
            PipelineStage::Skip(_) => "Skip",
            PipelineStage::Take(_) => "Take",
            PipelineStage::OrderBy { append: false, .. } => "OrderBy",
            PipelineStage::OrderBy { append: true, .. } => "ThenBy",
            PipelineStage::SetOp { kind, .. } => kind.as_str(),
            PipelineStage::Call { operator, .. } => operator.as_str(),
        }
    }

    /// Returns true if nothing may follow this stage
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Call { .. })
    }

    /// Structural equality with lambdas compared up to parameter renaming
    pub fn equivalent(&self, other: &PipelineStage, comparer: &ExpressionComparer) -> bool {
        match (self, other) {
            (PipelineStage::Filter(a), PipelineStage::Filter(b))
            | (PipelineStage::Project(a), PipelineStage::Project(b)) => comparer.equivalent(a, b),
            (
                PipelineStage::OrderBy { keys: a, append: x },
                PipelineStage::OrderBy { keys: b, append: y },
            ) => {
                x == y
                    && a.len() == b.len()
                    && a.iter().zip(b).all(|(a, b)| {
                        a.direction == b.direction && comparer.equivalent(&a.selector, &b.selector)
                    })
            }
            (
                PipelineStage::Call {
                    operator: x,
                    args: a,
                },
                PipelineStage::Call {
                    operator: y,
                    args: b,
                },
            ) => {
                x == y && a.len() == b.len() && a.iter().zip(b).all(|(a, b)| comparer.equivalent(a, b))
            }
            (a, b) => a == b,
        }
    }
}
