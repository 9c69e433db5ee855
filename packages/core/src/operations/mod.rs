//! Operation Descriptors and Supporting Machinery
//!
//! This module provides the stateless descriptors for bulk table actions plus
//! the two pieces of control-flow machinery the coordinator builds on:
//!
//! - [`CoalescingQueue`] - debounced batching of selection events
//! - [`RetryPolicy`] - explicit retry schedule for transient store failures
//!
//! Descriptors carry no per-table state; the same [`BulkOperation`] value can
//! be handed to any coordinator instance.

pub mod coalesce;
pub mod retry;

// Re-export types for convenience
pub use coalesce::{CoalescingQueue, SelectionEvent};
pub use retry::RetryPolicy;

use serde::{Deserialize, Serialize};

/// The kind of mutation a bulk operation applies per row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BulkOperationKind {
    /// Remove the rows from the backing table
    Delete,

    /// Set `archived = true` on each row; already-archived rows are skipped
    Archive,

    /// Point a foreign-key field at a new target (e.g. move tenants to
    /// another apartment). Rows without the field fail validation.
    Reassign { target_field: String },

    /// Patch a fixed set of property fields from collected parameters.
    /// Rows for which the patch is empty are skipped.
    Update { fields: Vec<String> },
}

impl BulkOperationKind {
    /// Stable name used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Archive => "archive",
            Self::Reassign { .. } => "reassign",
            Self::Update { .. } => "update",
        }
    }
}

/// One field of the renderable parameter-collection step
///
/// The UI renders these as form inputs inside the confirmation dialog; the
/// collected values come back as a JSON object keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Key in the parameters object
    pub name: String,
    /// Human-readable label for the form input
    pub label: String,
    /// Whether execution is refused when the value is missing
    pub required: bool,
}

impl ParameterSpec {
    /// Create a required parameter field
    pub fn required(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            required: true,
        }
    }

    /// Create an optional parameter field
    pub fn optional(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            required: false,
        }
    }
}

/// Stateless descriptor of a bulk table action
///
/// # Examples
///
/// ```rust
/// use hausverwaltung_core::operations::BulkOperation;
///
/// let delete = BulkOperation::delete();
/// assert!(delete.requires_confirmation);
///
/// let reassign = BulkOperation::reassign("apartment_id");
/// assert_eq!(reassign.kind.name(), "reassign");
/// assert_eq!(reassign.parameters.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOperation {
    /// What the operation does per row
    pub kind: BulkOperationKind,
    /// Whether the UI must show a confirmation step before execution
    pub requires_confirmation: bool,
    /// Renderable parameter-collection step (empty for parameterless actions)
    pub parameters: Vec<ParameterSpec>,
}

impl BulkOperation {
    /// Destructive delete; always confirmed
    pub fn delete() -> Self {
        Self {
            kind: BulkOperationKind::Delete,
            requires_confirmation: true,
            parameters: Vec::new(),
        }
    }

    /// Archive without confirmation (reversible, low risk)
    pub fn archive() -> Self {
        Self {
            kind: BulkOperationKind::Archive,
            requires_confirmation: false,
            parameters: Vec::new(),
        }
    }

    /// Reassign the given foreign-key field to a new target
    ///
    /// The confirmation step collects the target id under the parameter name
    /// `target_id`.
    pub fn reassign(target_field: impl Into<String>) -> Self {
        let target_field = target_field.into();
        Self {
            kind: BulkOperationKind::Reassign {
                target_field: target_field.clone(),
            },
            requires_confirmation: true,
            parameters: vec![ParameterSpec::required(
                "target_id",
                format!("Neues Ziel für {target_field}"),
            )],
        }
    }

    /// Patch the given property fields from collected parameters
    pub fn update(fields: Vec<String>) -> Self {
        let parameters = fields
            .iter()
            .map(|field| ParameterSpec::optional(field.clone(), field.clone()))
            .collect();
        Self {
            kind: BulkOperationKind::Update { fields },
            requires_confirmation: true,
            parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(BulkOperationKind::Delete.name(), "delete");
        assert_eq!(BulkOperationKind::Archive.name(), "archive");
        assert_eq!(
            BulkOperationKind::Reassign {
                target_field: "apartment_id".to_string()
            }
            .name(),
            "reassign"
        );
    }

    #[test]
    fn test_delete_requires_confirmation() {
        assert!(BulkOperation::delete().requires_confirmation);
        assert!(!BulkOperation::archive().requires_confirmation);
    }

    #[test]
    fn test_reassign_declares_target_parameter() {
        let op = BulkOperation::reassign("apartment_id");
        assert_eq!(op.parameters.len(), 1);
        assert_eq!(op.parameters[0].name, "target_id");
        assert!(op.parameters[0].required);
    }

    #[test]
    fn test_update_declares_optional_parameters() {
        let op = BulkOperation::update(vec!["rent".to_string(), "deposit".to_string()]);
        assert_eq!(op.parameters.len(), 2);
        assert!(op.parameters.iter().all(|p| !p.required));
    }
}
