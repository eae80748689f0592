//! Executor error types
//!
//! Error codes:
//! - AERO_EXECUTION_FAILED
//! - AERO_EXECUTION_UNKNOWN_OPERATOR
//! - AERO_EXECUTION_MALFORMED_OPERAND

use thiserror::Error;

/// Failures raised at the executor boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutorError {
    /// The backing store could not run the query
    #[error("[ERROR] AERO_EXECUTION_FAILED: {0}")]
    Failed(String),

    /// The query document uses an operator the executor does not implement
    #[error("[ERROR] AERO_EXECUTION_UNKNOWN_OPERATOR: unknown query operator {operator}")]
    UnknownOperator { operator: String },

    /// An operator received an operand of the wrong shape
    #[error("[ERROR] AERO_EXECUTION_MALFORMED_OPERAND: {operator} {reason}")]
    MalformedOperand { operator: String, reason: String },
}

impl ExecutorError {
    pub fn failed(reason: impl Into<String>) -> Self {
        ExecutorError::Failed(reason.into())
    }

    pub fn unknown_operator(operator: impl Into<String>) -> Self {
        ExecutorError::UnknownOperator {
            operator: operator.into(),
        }
    }

    pub fn malformed(operator: impl Into<String>, reason: impl Into<String>) -> Self {
        ExecutorError::MalformedOperand {
            operator: operator.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorError::Failed(_) => "AERO_EXECUTION_FAILED",
            ExecutorError::UnknownOperator { .. } => "AERO_EXECUTION_UNKNOWN_OPERATOR",
            ExecutorError::MalformedOperand { .. } => "AERO_EXECUTION_MALFORMED_OPERAND",
        }
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ExecutorError::failed("down").code(), "AERO_EXECUTION_FAILED");
        assert_eq!(
            ExecutorError::unknown_operator("$where").code(),
            "AERO_EXECUTION_UNKNOWN_OPERATOR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = ExecutorError::malformed("$size", "expects an integer");
        let display = err.to_string();
        assert!(display.contains("AERO_EXECUTION_MALFORMED_OPERAND"));
        assert!(display.contains("$size expects an integer"));
    }
}
