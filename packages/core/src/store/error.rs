//! Store Error Types
//!
//! This module defines error types for backend mutations, with the
//! transient/permanent classification the bulk executor relies on: transient
//! failures (timeout, connection) are retried and reported as retryable,
//! permanent failures (missing row, permission, constraint) are reported once
//! and never retried automatically.

use thiserror::Error;

/// Backend mutation errors
///
/// `Clone` and `PartialEq` are derived because per-row failures travel inside
/// result objects that tests compare structurally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Request exceeded its deadline (transient)
    #[error("Request timed out: {context}")]
    Timeout { context: String },

    /// Network/connection failure (transient)
    #[error("Connection failed: {context}")]
    Connection { context: String },

    /// Referenced row does not exist (permanent)
    #[error("Row '{id}' does not exist")]
    RowNotFound { id: String },

    /// Caller lacks permission for the row (permanent)
    #[error("Permission denied for row '{id}': {reason}")]
    PermissionDenied { id: String, reason: String },

    /// Backend rejected the mutation payload (permanent)
    #[error("Constraint violated: {0}")]
    Constraint(String),

    /// Payload could not be encoded/decoded (permanent)
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Unexpected backend failure (permanent; indicates a bug or outage)
    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Create a timeout error
    pub fn timeout(context: impl Into<String>) -> Self {
        Self::Timeout {
            context: context.into(),
        }
    }

    /// Create a connection error
    pub fn connection(context: impl Into<String>) -> Self {
        Self::Connection {
            context: context.into(),
        }
    }

    /// Create a row not found error
    pub fn row_not_found(id: impl Into<String>) -> Self {
        Self::RowNotFound { id: id.into() }
    }

    /// Create a permission denied error
    pub fn permission_denied(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a constraint error
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a retry may succeed without anything else changing
    ///
    /// Only timeouts and connection failures qualify. Everything else requires
    /// user or backend intervention first.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Connection { .. })
    }
}
