//! Top-level query errors
//!
//! Error codes:
//! - translation and execution errors keep their own codes
//! - AERO_QUERY_SEQUENCE_EMPTY
//! - AERO_QUERY_MORE_THAN_ONE_ELEMENT

use thiserror::Error;

use crate::executor::ExecutorError;
use crate::translator::TranslationError;

/// Failure while translating, executing or materializing a pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Execution(#[from] ExecutorError),

    /// `First`, `Single` or `ElementAt` found no element
    #[error("[ERROR] AERO_QUERY_SEQUENCE_EMPTY: Sequence contains no elements")]
    SequenceEmpty,

    /// `Single` found more than one element
    #[error("[ERROR] AERO_QUERY_MORE_THAN_ONE_ELEMENT: Sequence contains more than one element")]
    MoreThanOneElement,
}

impl QueryError {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Translation(err) => err.code().code(),
            QueryError::Execution(err) => err.code(),
            QueryError::SequenceEmpty => "AERO_QUERY_SEQUENCE_EMPTY",
            QueryError::MoreThanOneElement => "AERO_QUERY_MORE_THAN_ONE_ELEMENT",
        }
    }
}

/// Result type for pipeline execution
pub type QueryOutcome<T> = Result<T, QueryError>;
