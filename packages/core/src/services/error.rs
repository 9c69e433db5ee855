//! Service Layer Error Types
//!
//! Errors here mean the caller drove the operation state machine incorrectly
//! (confirming with nothing pending, starting an operation mid-execution).
//! Row-level and parse-level failures never surface as `Err`; they are encoded
//! in `ValidationResult`, `BulkOperationResult`, and `ParseResult`.

use thiserror::Error;

/// Protocol misuse errors for the bulk-operation coordinator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// An operation is already pending or executing
    #[error("Operation '{operation}' is already in progress")]
    OperationInFlight { operation: String },

    /// `confirm` called with no operation awaiting confirmation
    #[error("No operation awaiting confirmation")]
    NothingToConfirm,

    /// `cancel` called while a mutation request is in flight
    #[error("Cannot cancel while executing; results will be applied when the request resolves")]
    CancelWhileExecuting,

    /// A required confirmation parameter was not provided
    #[error("Missing required parameter: {name}")]
    MissingParameter { name: String },
}

impl CoordinatorError {
    /// Create an operation in flight error
    pub fn operation_in_flight(operation: impl Into<String>) -> Self {
        Self::OperationInFlight {
            operation: operation.into(),
        }
    }

    /// Create a missing parameter error
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }
}
