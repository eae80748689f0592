//! Pipeline translation
//!
//! Stages are walked front to back. Filters and type narrowings contribute
//! clause fragments in encounter order; the composer merges them into one
//! query document. Ordering keys, the projection and the result window are
//! tracked alongside.
//!
//! Window arithmetic:
//! - `Skip(n)`: skip += n, limit -= n (saturating)
//! - `Take(m)`: limit = min(limit, m)
//! - `First`, `Any`: Take(1)
//! - `Single`: Take(2), so a second match is detectable
//! - `ElementAt(n)`: Skip(n) then Take(1)

use super::query::{ResultShape, TranslatedQuery};
use super::stage::{PipelineStage, QueryOperator};
use crate::expression::{ExpressionNode, TypeRef};
use crate::translator::{
    ClauseComposer, PredicateTranslator, ProjectionTranslator, Serializer, SortKey, TranslationError,
    TranslationResult, TypeFilterTranslator,
};

/// Result window accumulated across `Skip`/`Take`-like stages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Window {
    skip: u64,
    limit: Option<u64>,
}

impl Window {
    fn skip(&mut self, n: u64) {
        self.skip = self.skip.saturating_add(n);
        self.limit = self.limit.map(|limit| limit.saturating_sub(n));
    }

    fn take(&mut self, m: u64) {
        self.limit = Some(self.limit.map_or(m, |limit| limit.min(m)));
    }
}

/// Folds a stage list into one translated query
pub struct PipelineTranslator<'a> {
    collection: &'a str,
    document_type: &'a TypeRef,
    type_filters: TypeFilterTranslator<'a>,
    predicates: PredicateTranslator<'a>,
    projections: ProjectionTranslator,
}

impl<'a> PipelineTranslator<'a> {
    pub fn new(
        collection: &'a str,
        document_type: &'a TypeRef,
        type_filters: TypeFilterTranslator<'a>,
        serializer: &'a dyn Serializer,
    ) -> Self {
        Self {
            collection,
            document_type,
            type_filters,
            predicates: PredicateTranslator::new(type_filters, serializer),
            projections: ProjectionTranslator::new(),
        }
    }

    pub fn translate(&self, stages: &[PipelineStage]) -> TranslationResult<TranslatedQuery> {
        let mut composer = ClauseComposer::new();
        let mut element_type = self.document_type.clone();
        let mut projection = None;
        let mut sort_keys: Vec<SortKey> = Vec::new();
        let mut window = Window::default();
        let mut result = ResultShape::Sequence;

        for stage in stages {
            match stage {
                PipelineStage::Filter(lambda) => {
                    composer.extend(self.predicates.translate_lambda(lambda)?);
                }
                PipelineStage::TypeNarrow(ty) => {
                    composer.extend(self.type_filters.narrow_to_subtree(ty)?);
                    element_type = ty.clone();
                }
                PipelineStage::Project(lambda) => {
                    projection = self.projections.translate_projection(lambda)?;
                    if let Some((_, body)) = lambda.as_lambda() {
                        element_type = body.ty.clone();
                    }
                }
                PipelineStage::Skip(n) => window.skip(*n),
                PipelineStage::Take(m) => window.take(*m),
                PipelineStage::OrderBy { keys, append } => {
                    if !*append {
                        sort_keys.clear();
                    }
                    sort_keys.extend(keys.iter().cloned());
                }
                PipelineStage::SetOp { kind, .. } => {
                    return Err(TranslationError::unsupported_operator(kind.as_str()));
                }
                PipelineStage::Call { operator, args } => {
                    result = self.translate_call(*operator, args, &mut composer, &mut window)?;
                }
            }
        }

        let sort = if sort_keys.is_empty() {
            None
        } else {
            Some(self.projections.translate_sort(&sort_keys)?)
        };

        Ok(TranslatedQuery {
            collection: self.collection.to_string(),
            document_type: self.document_type.clone(),
            element_type,
            query: composer.finish(),
            projection,
            sort,
            skip: (window.skip > 0).then_some(window.skip),
            limit: window.limit,
            result,
        })
    }

    fn translate_call(
        &self,
        operator: QueryOperator,
        args: &[ExpressionNode],
        composer: &mut ClauseComposer,
        window: &mut Window,
    ) -> TranslationResult<ResultShape> {
        if operator.accepts_predicate() {
            if let Some(predicate) = args.first() {
                composer.extend(self.predicates.translate_lambda(predicate)?);
            }
        }

        let shape = match operator {
            QueryOperator::First | QueryOperator::FirstOrDefault => {
                window.take(1);
                ResultShape::First {
                    or_default: operator == QueryOperator::FirstOrDefault,
                }
            }
            QueryOperator::Single | QueryOperator::SingleOrDefault => {
                window.take(2);
                ResultShape::Single {
                    or_default: operator == QueryOperator::SingleOrDefault,
                }
            }
            QueryOperator::Any => {
                window.take(1);
                ResultShape::Any
            }
            QueryOperator::Count | QueryOperator::LongCount => ResultShape::Count,
            QueryOperator::ElementAt | QueryOperator::ElementAtOrDefault => {
                window.skip(element_index(operator, args)?);
                window.take(1);
                ResultShape::ElementAt {
                    or_default: operator == QueryOperator::ElementAtOrDefault,
                }
            }
            _ => return Err(TranslationError::unsupported_operator(operator.as_str())),
        };
        Ok(shape)
    }
}

fn element_index(operator: QueryOperator, args: &[ExpressionNode]) -> TranslationResult<u64> {
    args.first()
        .and_then(ExpressionNode::as_literal)
        .and_then(|literal| literal.as_i64())
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| {
            TranslationError::unsupported_operator_usage(
                operator.as_str(),
                "it takes one non-negative integer constant index",
            )
        })
}
