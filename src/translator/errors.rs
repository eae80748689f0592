//! Translation error types
//!
//! Error codes:
//! - AERO_QUERY_UNSUPPORTED_OPERATOR (REJECT)
//! - AERO_QUERY_UNSUPPORTED_EXPRESSION (REJECT)
//! - AERO_QUERY_UNSUPPORTED_VALUE_TYPE (REJECT)
//! - AERO_QUERY_AMBIGUOUS_TYPE_FILTER (REJECT)
//! - AERO_QUERY_INVALID_HIERARCHY (REJECT)
//!
//! Every translation error is fatal for the query that produced it. There is
//! no partial document.

use std::fmt;

use super::serializer::SerializationError;

/// Translation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationErrorCode {
    /// Pipeline stage or operator has no translation rule
    UnsupportedOperator,
    /// Expression shape has no translation rule
    UnsupportedExpression,
    /// Literal cannot be represented in a query document
    UnsupportedValueType,
    /// Type filter names a type outside the target hierarchy
    AmbiguousTypeFilter,
    /// Type metadata does not form a single-rooted tree
    InvalidHierarchy,
}

impl TranslationErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            TranslationErrorCode::UnsupportedOperator => "AERO_QUERY_UNSUPPORTED_OPERATOR",
            TranslationErrorCode::UnsupportedExpression => "AERO_QUERY_UNSUPPORTED_EXPRESSION",
            TranslationErrorCode::UnsupportedValueType => "AERO_QUERY_UNSUPPORTED_VALUE_TYPE",
            TranslationErrorCode::AmbiguousTypeFilter => "AERO_QUERY_AMBIGUOUS_TYPE_FILTER",
            TranslationErrorCode::InvalidHierarchy => "AERO_QUERY_INVALID_HIERARCHY",
        }
    }
}

impl fmt::Display for TranslationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Translation error with full context
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationError {
    /// Error code
    code: TranslationErrorCode,
    /// Human-readable message
    message: String,
    /// Offending operator, node kind or type name
    subject: Option<String>,
}

impl TranslationError {
    /// Create an unsupported operator error
    pub fn unsupported_operator(operator: impl Into<String>) -> Self {
        let op = operator.into();
        Self {
            code: TranslationErrorCode::UnsupportedOperator,
            message: format!("The {} query operator is not supported.", op),
            subject: Some(op),
        }
    }

    /// Create an unsupported operator error for a supported operator used in
    /// an unsupported position or overload
    pub fn unsupported_operator_usage(operator: impl Into<String>, reason: impl Into<String>) -> Self {
        let op = operator.into();
        Self {
            code: TranslationErrorCode::UnsupportedOperator,
            message: format!("The {} query operator is not supported here: {}", op, reason.into()),
            subject: Some(op),
        }
    }

    /// Create an unsupported expression error
    pub fn unsupported_expression(node_kind: impl Into<String>, detail: impl Into<String>) -> Self {
        let kind = node_kind.into();
        Self {
            code: TranslationErrorCode::UnsupportedExpression,
            message: format!("Unsupported {} expression: {}", kind, detail.into()),
            subject: Some(kind),
        }
    }

    /// Wrap a serializer failure
    pub fn unsupported_value_type(source: SerializationError) -> Self {
        Self {
            code: TranslationErrorCode::UnsupportedValueType,
            subject: Some(source.type_name().to_string()),
            message: source.to_string(),
        }
    }

    /// Create an ambiguous type filter error
    pub fn ambiguous_type_filter(type_name: impl Into<String>, root: impl Into<String>) -> Self {
        let ty = type_name.into();
        Self {
            code: TranslationErrorCode::AmbiguousTypeFilter,
            message: format!(
                "Type '{}' is not part of the hierarchy rooted at '{}'",
                ty,
                root.into()
            ),
            subject: Some(ty),
        }
    }

    /// Create an invalid hierarchy error
    pub fn invalid_hierarchy(reason: impl Into<String>) -> Self {
        Self {
            code: TranslationErrorCode::InvalidHierarchy,
            message: reason.into(),
            subject: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> TranslationErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending operator, node kind or type name
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for TranslationError {}

/// Result type for translation operations
pub type TranslationResult<T> = Result<T, TranslationError>;
