//! Expression-to-query-document translation
//!
//! # Components
//!
//! - `document`: ordered query documents with duplicate keys
//! - `composer`: merges clause fragments in encounter order
//! - `type_filter`: discriminator clauses for type narrowing
//! - `predicate`: filter lambdas to clause fragments
//! - `projection`: projection and sort documents
//! - `serializer`: literal operands to query values
//! - `errors`: translation error taxonomy

mod composer;
mod document;
mod errors;
mod predicate;
mod projection;
mod serializer;
mod type_filter;

pub use composer::ClauseComposer;
pub use document::{ClauseFragment, ClauseValue, OperatorObject, QueryDocument, DISCRIMINATOR_FIELD};
pub use errors::{TranslationError, TranslationErrorCode, TranslationResult};
pub use predicate::PredicateTranslator;
pub use projection::{ProjectionTranslator, SortDirection, SortKey};
pub use serializer::{JsonSerializer, SerializationError, Serializer};
pub use type_filter::TypeFilterTranslator;
