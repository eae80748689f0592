//! aeroquery - Typed query translation for polymorphic document collections
//!
//! Composed query pipelines (filters, type narrowing, projections, ordering,
//! paging and terminal operators) are translated into one query document for
//! a single collection. Inheritance hierarchies are encoded through the `_t`
//! discriminator field.

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod expression;
pub mod hierarchy;
pub mod observability;
pub mod pipeline;
pub mod translator;

pub use config::{ServerCapabilities, ServerVersion, TranslatorConfig};
pub use context::QueryContext;
pub use error::{QueryError, QueryOutcome};
pub use executor::{Executor, MemoryExecutor, QueryResult};
pub use expression::{ExpressionNode, TypeRef, Variable};
pub use hierarchy::{TypeDescriptor, TypeRegistry};
pub use pipeline::{Pipeline, TranslatedQuery};
pub use translator::{QueryDocument, TranslationError, TranslationErrorCode, TranslationResult};
