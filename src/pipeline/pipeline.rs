//! Immutable query pipelines
//!
//! Every builder call validates the new stage and returns a new pipeline;
//! the receiver is never modified. Stage lists are shared through `Arc`, so
//! clones are cheap and a pipeline may be used from many threads at once.
//!
//! Translation is lazy and happens at most once per pipeline value. The
//! outcome, success or failure, is kept for the life of the value.

use std::fmt;
use std::sync::{Arc, OnceLock};

use super::query::{ResultShape, TranslatedQuery};
use super::stage::{PipelineStage, QueryOperator, SetOperator};
use super::translate::PipelineTranslator;
use super::validator::StageValidator;
use crate::config::ServerCapabilities;
use crate::error::{QueryError, QueryOutcome};
use crate::executor::{DocumentStream, Executor, QueryResult, RawDocument};
use crate::expression::{ExpressionComparer, ExpressionNode, QueryableHandle, TypeRef};
use crate::hierarchy::TypeHierarchy;
use crate::observability::{Event, Logger, Severity, TranslationMetrics};
use crate::translator::{
    Serializer, SortKey, TranslationError, TranslationResult, TypeFilterTranslator,
};

/// Everything a pipeline needs besides its stages
pub(crate) struct PipelineEnv {
    pub(crate) collection: String,
    pub(crate) document_type: TypeRef,
    pub(crate) hierarchy: Arc<TypeHierarchy>,
    pub(crate) capabilities: ServerCapabilities,
    pub(crate) serializer: Arc<dyn Serializer>,
    pub(crate) metrics: Arc<TranslationMetrics>,
}

/// A composed query against one collection
#[derive(Clone)]
pub struct Pipeline {
    env: Arc<PipelineEnv>,
    stages: Arc<Vec<PipelineStage>>,
    element_type: TypeRef,
    translation: Arc<OnceLock<TranslationResult<TranslatedQuery>>>,
}

impl Pipeline {
    pub(crate) fn new(env: PipelineEnv) -> Self {
        let element_type = env.document_type.clone();
        Self {
            env: Arc::new(env),
            stages: Arc::new(Vec::new()),
            element_type,
            translation: Arc::new(OnceLock::new()),
        }
    }

    pub fn collection(&self) -> &str {
        &self.env.collection
    }

    pub fn document_type(&self) -> &TypeRef {
        &self.env.document_type
    }

    /// Element type after the last stage
    pub fn element_type(&self) -> &TypeRef {
        &self.element_type
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.env.hierarchy
    }

    /// Returns true once this pipeline value has been translated
    pub fn is_translated(&self) -> bool {
        self.translation.get().is_some()
    }

    // =========================================================================
    // Builders
    // =========================================================================

    /// `Where(predicate)`
    pub fn filter(&self, predicate: ExpressionNode) -> TranslationResult<Pipeline> {
        self.append(PipelineStage::Filter(predicate))
    }

    /// `OfType<T>()`
    pub fn of_type(&self, ty: impl Into<TypeRef>) -> TranslationResult<Pipeline> {
        self.append(PipelineStage::TypeNarrow(ty.into()))
    }

    /// `Select(projection)`
    pub fn select(&self, projection: ExpressionNode) -> TranslationResult<Pipeline> {
        self.append(PipelineStage::Project(projection))
    }

    pub fn skip(&self, n: u64) -> TranslationResult<Pipeline> {
        self.append(PipelineStage::Skip(n))
    }

    pub fn take(&self, m: u64) -> TranslationResult<Pipeline> {
        self.append(PipelineStage::Take(m))
    }

    pub fn order_by(&self, selector: ExpressionNode) -> TranslationResult<Pipeline> {
        self.ordered(SortKey::asc(selector), false)
    }

    pub fn order_by_descending(&self, selector: ExpressionNode) -> TranslationResult<Pipeline> {
        self.ordered(SortKey::desc(selector), false)
    }

    pub fn then_by(&self, selector: ExpressionNode) -> TranslationResult<Pipeline> {
        self.ordered(SortKey::asc(selector), true)
    }

    pub fn then_by_descending(&self, selector: ExpressionNode) -> TranslationResult<Pipeline> {
        self.ordered(SortKey::desc(selector), true)
    }

    pub fn concat(&self, other: QueryableHandle) -> TranslationResult<Pipeline> {
        self.set_op(SetOperator::Concat, other)
    }

    pub fn union(&self, other: QueryableHandle) -> TranslationResult<Pipeline> {
        self.set_op(SetOperator::Union, other)
    }

    pub fn intersect(&self, other: QueryableHandle) -> TranslationResult<Pipeline> {
        self.set_op(SetOperator::Intersect, other)
    }

    pub fn except(&self, other: QueryableHandle) -> TranslationResult<Pipeline> {
        self.set_op(SetOperator::Except, other)
    }

    /// Appends a named operator with its arguments
    pub fn call(&self, operator: QueryOperator, args: Vec<ExpressionNode>) -> TranslationResult<Pipeline> {
        self.append(PipelineStage::Call { operator, args })
    }

    pub fn first(&self) -> TranslationResult<Pipeline> {
        self.call(QueryOperator::First, Vec::new())
    }

    pub fn first_or_default(&self) -> TranslationResult<Pipeline> {
        self.call(QueryOperator::FirstOrDefault, Vec::new())
    }

    pub fn single(&self) -> TranslationResult<Pipeline> {
        self.call(QueryOperator::Single, Vec::new())
    }

    pub fn single_or_default(&self) -> TranslationResult<Pipeline> {
        self.call(QueryOperator::SingleOrDefault, Vec::new())
    }

    pub fn any(&self) -> TranslationResult<Pipeline> {
        self.call(QueryOperator::Any, Vec::new())
    }

    pub fn count(&self) -> TranslationResult<Pipeline> {
        self.call(QueryOperator::Count, Vec::new())
    }

    pub fn element_at(&self, index: u64) -> TranslationResult<Pipeline> {
        let index = i64::try_from(index).unwrap_or(i64::MAX);
        self.call(QueryOperator::ElementAt, vec![ExpressionNode::literal(index)])
    }

    fn ordered(&self, key: SortKey, append: bool) -> TranslationResult<Pipeline> {
        self.append(PipelineStage::OrderBy {
            keys: vec![key],
            append,
        })
    }

    fn set_op(&self, kind: SetOperator, other: QueryableHandle) -> TranslationResult<Pipeline> {
        self.append(PipelineStage::SetOp { kind, other })
    }

    fn append(&self, stage: PipelineStage) -> TranslationResult<Pipeline> {
        if let Err(err) = StageValidator::new(&self.env.hierarchy).validate_append(&self.stages, &stage) {
            self.env.metrics.increment_rejections();
            Logger::warn(
                Event::PipelineStageRejected,
                &[
                    ("code", err.code().code()),
                    ("collection", self.env.collection.as_str()),
                    ("operator", stage.kind_name()),
                ],
            );
            return Err(err);
        }

        let element_type = match &stage {
            PipelineStage::TypeNarrow(ty) => ty.clone(),
            PipelineStage::Project(lambda) => lambda
                .as_lambda()
                .map_or_else(|| self.element_type.clone(), |(_, body)| body.ty.clone()),
            _ => self.element_type.clone(),
        };

        let mut stages = Vec::with_capacity(self.stages.len() + 1);
        stages.extend(self.stages.iter().cloned());
        stages.push(stage);

        Ok(Pipeline {
            env: Arc::clone(&self.env),
            stages: Arc::new(stages),
            element_type,
            translation: Arc::new(OnceLock::new()),
        })
    }

    // =========================================================================
    // Translation
    // =========================================================================

    /// Translates the pipeline, once
    pub fn translate(&self) -> TranslationResult<TranslatedQuery> {
        self.translation
            .get_or_init(|| self.translate_uncached())
            .clone()
    }

    fn translate_uncached(&self) -> TranslationResult<TranslatedQuery> {
        let env = &self.env;
        let type_filters = TypeFilterTranslator::new(&env.hierarchy, env.capabilities, &env.metrics);
        let result = PipelineTranslator::new(
            &env.collection,
            &env.document_type,
            type_filters,
            env.serializer.as_ref(),
        )
        .translate(&self.stages);

        match &result {
            Ok(query) => {
                env.metrics.increment_translations();
                if Logger::enabled(Severity::Trace) {
                    let rendered = query.query.to_string();
                    let stages = self.stages.len().to_string();
                    Logger::trace(
                        Event::TranslationComplete,
                        &[
                            ("collection", env.collection.as_str()),
                            ("query", rendered.as_str()),
                            ("stages", stages.as_str()),
                        ],
                    );
                }
            }
            Err(err) => {
                env.metrics.increment_rejections();
                Logger::error(
                    Event::TranslationFailed,
                    &[
                        ("code", err.code().code()),
                        ("collection", env.collection.as_str()),
                        ("message", err.message()),
                    ],
                );
            }
        }
        result
    }

    /// Structural equality of two pipelines, lambdas compared up to
    /// parameter renaming
    pub fn equivalent(&self, other: &Pipeline) -> bool {
        let comparer = ExpressionComparer::new();
        self.env.collection == other.env.collection
            && self.env.document_type == other.env.document_type
            && self.stages.len() == other.stages.len()
            && self
                .stages
                .iter()
                .zip(other.stages.iter())
                .all(|(a, b)| a.equivalent(b, &comparer))
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Translates, runs and materializes the pipeline
    pub fn execute(&self, executor: &dyn Executor) -> QueryOutcome<QueryResult> {
        let query = self.translate()?;
        let stream = executor.execute(&query.collection, &query.to_request())?;

        self.env.metrics.increment_executions();
        Logger::trace(
            Event::QueryExecuted,
            &[("collection", query.collection.as_str()), ("result", query.result.as_str())],
        );

        materialize(query.result, stream)
    }

    /// Result documents; a single-document result is returned as a list of
    /// zero or one
    pub fn to_list(&self, executor: &dyn Executor) -> QueryOutcome<Vec<RawDocument>> {
        match self.execute(executor)? {
            QueryResult::Documents(documents) => Ok(documents),
            QueryResult::Document(document) => Ok(document.into_iter().collect()),
            QueryResult::Count(_) | QueryResult::Bool(_) => Err(QueryError::Translation(
                TranslationError::unsupported_operator_usage("ToList", "the pipeline ends in a scalar operator"),
            )),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("collection", &self.env.collection)
            .field("document_type", &self.env.document_type)
            .field("element_type", &self.element_type)
            .field("stages", &self.stages)
            .finish()
    }
}

fn materialize(shape: ResultShape, mut stream: DocumentStream) -> QueryOutcome<QueryResult> {
    match shape {
        ResultShape::Sequence => Ok(QueryResult::Documents(stream.collect::<Result<Vec<_>, _>>()?)),
        ResultShape::First { or_default } | ResultShape::ElementAt { or_default } => {
            match stream.next().transpose()? {
                Some(document) => Ok(QueryResult::Document(Some(document))),
                None if or_default => Ok(QueryResult::Document(None)),
                None => Err(QueryError::SequenceEmpty),
            }
        }
        ResultShape::Single { or_default } => {
            let first = stream.next().transpose()?;
            let second = stream.next().transpose()?;
            match (first, second) {
                (Some(_), Some(_)) => Err(QueryError::MoreThanOneElement),
                (Some(document), None) => Ok(QueryResult::Document(Some(document))),
                (None, _) if or_default => Ok(QueryResult::Document(None)),
                (None, _) => Err(QueryError::SequenceEmpty),
            }
        }
        ResultShape::Any => Ok(QueryResult::Bool(stream.next().transpose()?.is_some())),
        ResultShape::Count => {
            let mut count = 0u64;
            for document in stream {
                document?;
                count += 1;
            }
            Ok(QueryResult::Count(count))
        }
    }
}
