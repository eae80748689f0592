//! Append-time stage validation
//!
//! A stage is checked against the stages already in the pipeline before it
//! is appended. Rules, in order:
//!
//! 1. Nothing may follow a terminal operator
//! 2. Set operators and unsupported named operators are rejected outright
//! 3. Operator arguments must have the expected shape
//! 4. `Where`, `OrderBy` and `OfType` may not follow `Select`, and `Select`
//!    may not follow `Select`
//! 5. `Where`, `OrderBy`, `OfType` and predicate operators may not follow
//!    `Skip` or `Take`
//! 6. `ThenBy` needs a preceding `OrderBy`
//! 7. `OfType` must name a type of the pipeline's hierarchy

use super::stage::{PipelineStage, QueryOperator, SetOperator};
use crate::expression::ExpressionNode;
use crate::hierarchy::TypeHierarchy;
use crate::translator::{TranslationError, TranslationResult};

/// Static support table for named operators
pub struct OperatorSupport;

impl OperatorSupport {
    /// Operators that translate into a single find
    pub const SUPPORTED: &'static [QueryOperator] = &[
        QueryOperator::First,
        QueryOperator::FirstOrDefault,
        QueryOperator::Single,
        QueryOperator::SingleOrDefault,
        QueryOperator::Any,
        QueryOperator::Count,
        QueryOperator::LongCount,
        QueryOperator::ElementAt,
        QueryOperator::ElementAtOrDefault,
    ];

    pub fn is_supported(operator: QueryOperator) -> bool {
        Self::SUPPORTED.contains(&operator)
    }

    /// No set operator maps onto a single-collection find
    pub fn is_set_supported(_operator: SetOperator) -> bool {
        false
    }
}

/// Checks stages against the pipeline they are appended to
pub struct StageValidator<'a> {
    hierarchy: &'a TypeHierarchy,
}

impl<'a> StageValidator<'a> {
    pub fn new(hierarchy: &'a TypeHierarchy) -> Self {
        Self { hierarchy }
    }

    /// Validates appending `stage` after `existing`
    pub fn validate_append(&self, existing: &[PipelineStage], stage: &PipelineStage) -> TranslationResult<()> {
        let name = stage.kind_name();

        // 1. Terminal operators end the pipeline
        if let Some(last) = existing.last().filter(|s| s.is_terminal()) {
            return Err(TranslationError::unsupported_operator_usage(
                name,
                format!("no operator may follow {}", last.kind_name()),
            ));
        }

        // 2. Outright unsupported operators
        match stage {
            PipelineStage::SetOp { kind, .. } if !OperatorSupport::is_set_supported(*kind) => {
                return Err(TranslationError::unsupported_operator(kind.as_str()));
            }
            PipelineStage::Call { operator, .. } if !OperatorSupport::is_supported(*operator) => {
                return Err(TranslationError::unsupported_operator(operator.as_str()));
            }
            _ => {}
        }

        // 3. Argument shapes
        if let PipelineStage::Call { operator, args } = stage {
            Self::validate_arguments(*operator, args)?;
        }

        let projected = existing.iter().any(|s| matches!(s, PipelineStage::Project(_)));
        let windowed = existing
            .iter()
            .any(|s| matches!(s, PipelineStage::Skip(_) | PipelineStage::Take(_)));
        let narrows = matches!(
            stage,
            PipelineStage::Filter(_) | PipelineStage::OrderBy { .. } | PipelineStage::TypeNarrow(_)
        );

        // 4. Projection ends document-level operators
        if projected && (narrows || matches!(stage, PipelineStage::Project(_))) {
            return Err(TranslationError::unsupported_operator_usage(
                name,
                "it cannot follow a Select projection",
            ));
        }

        // 5. Filters and orderings apply before the result window
        if windowed && (narrows || has_predicate(stage)) {
            return Err(TranslationError::unsupported_operator_usage(
                name,
                "it cannot follow Skip or Take",
            ));
        }

        // 6. ThenBy extends an ordering
        if let PipelineStage::OrderBy { append: true, .. } = stage {
            let ordered = existing
                .iter()
                .any(|s| matches!(s, PipelineStage::OrderBy { .. }));
            if !ordered {
                return Err(TranslationError::unsupported_operator_usage(
                    name,
                    "it requires a preceding OrderBy",
                ));
            }
        }

        // 7. Type narrowing stays inside the hierarchy
        if let PipelineStage::TypeNarrow(ty) = stage {
            self.hierarchy.require(ty.name())?;
        }

        Ok(())
    }

    fn validate_arguments(operator: QueryOperator, args: &[ExpressionNode]) -> TranslationResult<()> {
        if operator.takes_index() {
            let index = match args {
                [arg] => arg.as_literal().and_then(|literal| literal.as_i64()),
                _ => None,
            };
            return match index {
                Some(n) if n >= 0 => Ok(()),
                _ => Err(TranslationError::unsupported_operator_usage(
                    operator.as_str(),
                    "it takes one non-negative integer constant index",
                )),
            };
        }

        match args {
            [] => Ok(()),
            [predicate] if operator.accepts_predicate() && predicate.as_lambda().is_some() => Ok(()),
            _ => Err(TranslationError::unsupported_operator_usage(
                operator.as_str(),
                "it takes at most one predicate lambda",
            )),
        }
    }
}

fn has_predicate(stage: &PipelineStage) -> bool {
    matches!(stage, PipelineStage::Call { args, operator } if operator.accepts_predicate() && !args.is_empty())
}
