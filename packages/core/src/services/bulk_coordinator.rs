//! Bulk-Operation Coordinator
//!
//! This module provides the main business logic layer for bulk table
//! operations:
//!
//! - Selection state with debounced event coalescing
//! - Fresh per-invocation validation against the current dataset
//! - Per-row independent execution with transient-failure retry
//! - The confirmation state machine driving the dialog flow
//!
//! # State Machine
//!
//! Each operation invocation moves through
//! `Idle → Validating → (Rejected | Confirming) → Executing →
//! (Completed | PartiallyFailed) → Idle`. `Confirming` is entered only when
//! the operation descriptor requires confirmation; cancellation is permitted
//! from every state except `Executing`.
//!
//! # Ownership
//!
//! One coordinator per table instance, owned exclusively (`&mut self` API).
//! The backing dataset is externally owned: the coordinator reads the snapshot
//! handed to [`BulkCoordinator::sync_dataset`] and requests mutations through
//! the store, but never caches or mutates row data on its own.

use crate::config::CoordinatorConfig;
use crate::models::{DataRow, SelectionSet};
use crate::operations::{
    BulkOperation, BulkOperationKind, CoalescingQueue, RetryPolicy, SelectionEvent,
};
use crate::services::error::CoordinatorError;
use crate::store::{RowMutation, RowStore, StoreError};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of validating an operation against the current selection
///
/// Computed fresh on every invocation and never cached: the selection or the
/// dataset may have changed since the operation was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// True when at least one row is valid and none are invalid
    pub is_valid: bool,
    /// Selected ids the operation may be applied to, in selection order
    pub valid_ids: Vec<String>,
    /// Selected ids that no longer exist or fail operation preconditions
    pub invalid_ids: Vec<String>,
    /// Human-readable reasons, one per invalid id (plus selection-level issues)
    pub errors: Vec<String>,
}

/// One row that could not be mutated, with its classified error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub id: String,
    pub error: StoreError,
}

/// Outcome of one bulk execution
///
/// Every id from the preceding validation's `valid_ids` is counted in exactly
/// one of updated/failed/skipped; nothing is silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOperationResult {
    /// Rows successfully mutated
    pub updated_count: usize,
    /// Rows whose mutation failed (after retries, for transient errors)
    pub failed_count: usize,
    /// Rows for which the mutation was a no-op (e.g. already archived)
    pub skipped_count: usize,
    /// True iff at least one failure is transient and worth retrying
    pub can_retry: bool,
    /// Ids with transient failures, for a manual or automatic retry pass
    pub retryable_ids: Vec<String>,
    /// Per-row failure detail for the error panel
    pub failures: Vec<RowFailure>,
}

/// Phases of one operation invocation
///
/// Only `Idle`, `Confirming`, and `Executing` persist between calls; the
/// remaining phases are passed through within a single invocation and logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationPhase {
    Idle,
    Validating,
    Rejected,
    Confirming,
    Executing,
    Completed,
    PartiallyFailed,
}

impl OperationPhase {
    /// Stable name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Rejected => "rejected",
            Self::Confirming => "confirming",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::PartiallyFailed => "partially-failed",
        }
    }
}

/// What happened when an operation was started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerformOutcome {
    /// No selected row survived validation; nothing was executed
    Rejected(ValidationResult),
    /// The descriptor requires confirmation; collect parameters and call
    /// [`BulkCoordinator::confirm`] (or [`BulkCoordinator::cancel`])
    AwaitingConfirmation(ValidationResult),
    /// The operation executed immediately
    Completed(BulkOperationResult),
}

/// Selection and bulk-mutation coordinator for one table instance
///
/// # Examples
///
/// ```rust
/// use hausverwaltung_core::config::CoordinatorConfig;
/// use hausverwaltung_core::models::DataRow;
/// use hausverwaltung_core::operations::BulkOperation;
/// use hausverwaltung_core::services::{BulkCoordinator, PerformOutcome};
/// use hausverwaltung_core::store::MemoryRowStore;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let store = Arc::new(MemoryRowStore::new());
/// let row = DataRow::new("tenant".to_string(), json!({"archived": false}));
/// let id = row.id.clone();
/// store.insert_row(row.clone());
///
/// let mut coordinator = BulkCoordinator::new(store, CoordinatorConfig::default());
/// coordinator.sync_dataset(vec![row]);
/// coordinator.select_row(id);
/// coordinator.flush_pending();
///
/// match coordinator
///     .perform_bulk_operation(BulkOperation::archive(), json!({}))
///     .await?
/// {
///     PerformOutcome::Completed(result) => assert_eq!(result.updated_count, 1),
///     other => panic!("unexpected outcome: {other:?}"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct BulkCoordinator {
    store: Arc<dyn RowStore>,
    config: CoordinatorConfig,
    selection: SelectionSet,
    queue: CoalescingQueue,
    /// Read-only snapshot of the backing dataset, keyed by row id
    rows: HashMap<String, DataRow>,
    phase: OperationPhase,
    pending: Option<BulkOperation>,
}

impl BulkCoordinator {
    /// Create a coordinator for one table instance
    pub fn new(store: Arc<dyn RowStore>, config: CoordinatorConfig) -> Self {
        let queue = CoalescingQueue::new(config.debounce_window(), config.max_batch_size);
        Self {
            store,
            config,
            selection: SelectionSet::new(),
            queue,
            rows: HashMap::new(),
            phase: OperationPhase::Idle,
            pending: None,
        }
    }

    /// Current phase of the operation state machine
    pub fn phase(&self) -> OperationPhase {
        self.phase
    }

    /// Selected ids as of the most recent flush (pending events excluded)
    pub fn selected_ids(&self) -> &[String] {
        self.selection.ids()
    }

    /// Replace the dataset snapshot after the data layer refetched rows
    ///
    /// Prunes selected ids that no longer exist (pending selection events are
    /// flushed first so they are pruned too). Returns the number of pruned ids.
    pub fn sync_dataset(&mut self, rows: Vec<DataRow>) -> usize {
        self.flush_pending();
        self.rows = rows.into_iter().map(|row| (row.id.clone(), row)).collect();
        let rows = &self.rows;
        let pruned = self.selection.prune(|id| rows.contains_key(id));
        if pruned > 0 {
            tracing::debug!("Pruned {} stale id(s) from selection on dataset refresh", pruned);
        }
        pruned
    }

    /// Mark a row selected
    pub fn select_row(&mut self, id: impl Into<String>) {
        self.enqueue(SelectionEvent::Select(id.into()));
    }

    /// Mark a row unselected
    pub fn deselect_row(&mut self, id: impl Into<String>) {
        self.enqueue(SelectionEvent::Deselect(id.into()));
    }

    /// Flip a row's selected state (checkbox click)
    pub fn toggle_row(&mut self, id: impl Into<String>) {
        self.enqueue(SelectionEvent::Toggle(id.into()));
    }

    /// Select every id in the list (header checkbox)
    pub fn select_all(&mut self, ids: Vec<String>) {
        self.enqueue(SelectionEvent::SelectAll(ids));
    }

    /// Clear the entire selection
    pub fn clear_selection(&mut self) {
        self.enqueue(SelectionEvent::Clear);
    }

    fn enqueue(&mut self, event: SelectionEvent) {
        if self.queue.push(event) {
            // Max batch size reached; apply now instead of waiting out the window
            self.flush_pending();
        }
    }

    /// Apply all queued selection events now
    ///
    /// Synchronous and deterministic; the UI's timer calls this when the
    /// debounce window elapses, tests call it directly.
    pub fn flush_pending(&mut self) -> usize {
        self.queue.flush_into(&mut self.selection)
    }

    /// Flush queued events if the debounce deadline has passed
    ///
    /// Returns true if a flush happened.
    pub fn poll_flush(&mut self, now: Instant) -> bool {
        if self.queue.has_pending() && self.queue.is_due(now) {
            self.flush_pending();
            true
        } else {
            false
        }
    }

    /// Validate an operation against the current selection and dataset
    ///
    /// Pending selection events are flushed first, so validation always
    /// observes the selection as of the most recently flushed batch. The
    /// result is computed fresh on every call; calling twice with no state
    /// change in between returns identical results.
    pub fn validate_operation(&mut self, operation: &BulkOperation) -> ValidationResult {
        self.flush_pending();
        self.compute_validation(operation)
    }

    fn compute_validation(&self, operation: &BulkOperation) -> ValidationResult {
        let mut valid_ids = Vec::new();
        let mut invalid_ids = Vec::new();
        let mut errors = Vec::new();

        if self.selection.is_empty() {
            return ValidationResult {
                is_valid: false,
                valid_ids,
                invalid_ids,
                errors: vec!["No rows selected".to_string()],
            };
        }

        for id in self.selection.ids() {
            match self.rows.get(id) {
                None => {
                    invalid_ids.push(id.clone());
                    errors.push(format!("Row '{id}' no longer exists"));
                }
                Some(row) => match Self::check_precondition(&operation.kind, row) {
                    Ok(()) => valid_ids.push(id.clone()),
                    Err(reason) => {
                        invalid_ids.push(id.clone());
                        errors.push(reason);
                    }
                },
            }
        }

        ValidationResult {
            is_valid: !valid_ids.is_empty() && invalid_ids.is_empty(),
            valid_ids,
            invalid_ids,
            errors,
        }
    }

    /// Operation-specific precondition for one row
    fn check_precondition(kind: &BulkOperationKind, row: &DataRow) -> Result<(), String> {
        match kind {
            BulkOperationKind::Reassign { target_field } => {
                if row.has_property(target_field) {
                    Ok(())
                } else {
                    Err(format!(
                        "Row '{}' has no settable field '{target_field}'",
                        row.id
                    ))
                }
            }
            BulkOperationKind::Delete
            | BulkOperationKind::Archive
            | BulkOperationKind::Update { .. } => Ok(()),
        }
    }

    /// Start a bulk operation against the current selection
    ///
    /// Validation runs first (always fresh). Operations whose descriptor
    /// requires confirmation park in `Confirming` and return
    /// [`PerformOutcome::AwaitingConfirmation`]; `parameters` passed here are
    /// discarded for that path and collected by the confirmation dialog
    /// instead. Parameterless unconfirmed operations execute immediately.
    ///
    /// # Errors
    ///
    /// - [`CoordinatorError::OperationInFlight`] when another operation is
    ///   confirming or executing
    /// - [`CoordinatorError::MissingParameter`] when a required parameter is
    ///   absent on the immediate-execution path; the coordinator remains
    ///   `Idle` and accepts the next call
    pub async fn perform_bulk_operation(
        &mut self,
        operation: BulkOperation,
        parameters: Value,
    ) -> Result<PerformOutcome, CoordinatorError> {
        if self.phase != OperationPhase::Idle {
            let name = self
                .pending
                .as_ref()
                .map(|pending| pending.kind.name())
                .unwrap_or(self.phase.name());
            return Err(CoordinatorError::operation_in_flight(name));
        }

        // Immediate-execution path: reject incomplete parameters before any
        // phase transition so the coordinator stays idle on error
        if !operation.requires_confirmation {
            Self::check_parameters(&operation, &parameters)?;
        }

        self.transition(OperationPhase::Validating);
        self.flush_pending();
        let validation = self.compute_validation(&operation);

        if validation.valid_ids.is_empty() {
            tracing::debug!(
                "Bulk operation '{}' rejected: {:?}",
                operation.kind.name(),
                validation.errors
            );
            self.transition(OperationPhase::Rejected);
            self.transition(OperationPhase::Idle);
            return Ok(PerformOutcome::Rejected(validation));
        }

        if operation.requires_confirmation {
            self.pending = Some(operation);
            self.transition(OperationPhase::Confirming);
            return Ok(PerformOutcome::AwaitingConfirmation(validation));
        }

        let result = self.execute(&operation, &parameters, validation).await;
        Ok(PerformOutcome::Completed(result))
    }

    /// Confirm the pending operation with the collected parameters
    ///
    /// Validation is re-run immediately before execution; rows that vanished
    /// or became invalid while the dialog was open are simply no longer part
    /// of the valid set. A missing required parameter leaves the coordinator
    /// in `Confirming` so the dialog can re-submit.
    pub async fn confirm(
        &mut self,
        parameters: Value,
    ) -> Result<BulkOperationResult, CoordinatorError> {
        if self.phase != OperationPhase::Confirming {
            return Err(CoordinatorError::NothingToConfirm);
        }
        let operation = match &self.pending {
            Some(operation) => operation.clone(),
            None => return Err(CoordinatorError::NothingToConfirm),
        };

        Self::check_parameters(&operation, &parameters)?;
        self.pending = None;

        self.transition(OperationPhase::Validating);
        self.flush_pending();
        let validation = self.compute_validation(&operation);

        if validation.valid_ids.is_empty() {
            tracing::debug!(
                "Confirmed operation '{}' had no valid rows left; nothing executed",
                operation.kind.name()
            );
            self.transition(OperationPhase::Rejected);
            self.transition(OperationPhase::Idle);
            return Ok(BulkOperationResult {
                updated_count: 0,
                failed_count: 0,
                skipped_count: 0,
                can_retry: false,
                retryable_ids: Vec::new(),
                failures: Vec::new(),
            });
        }

        Ok(self.execute(&operation, &parameters, validation).await)
    }

    /// Cancel the pending operation and return to idle
    ///
    /// Permitted from every state except `Executing`; pending parameters and
    /// the pending descriptor are discarded with no side effects.
    pub fn cancel(&mut self) -> Result<(), CoordinatorError> {
        if self.phase == OperationPhase::Executing {
            return Err(CoordinatorError::CancelWhileExecuting);
        }
        self.pending = None;
        self.transition(OperationPhase::Idle);
        Ok(())
    }

    /// Verify that every required parameter is present
    fn check_parameters(
        operation: &BulkOperation,
        parameters: &Value,
    ) -> Result<(), CoordinatorError> {
        for spec in &operation.parameters {
            if !spec.required {
                continue;
            }
            let present = parameters
                .as_object()
                .and_then(|map| map.get(&spec.name))
                .is_some_and(|value| !value.is_null());
            if !present {
                return Err(CoordinatorError::missing_parameter(spec.name.clone()));
            }
        }
        Ok(())
    }

    /// Execute the operation for every valid id, independently per row
    async fn execute(
        &mut self,
        operation: &BulkOperation,
        parameters: &Value,
        validation: ValidationResult,
    ) -> BulkOperationResult {
        self.transition(OperationPhase::Executing);

        let store = Arc::clone(&self.store);
        let policy = self.config.retry.clone();

        let mut updated_count = 0;
        let mut skipped_count = 0;
        let mut retryable_ids = Vec::new();
        let mut failures = Vec::new();

        for id in &validation.valid_ids {
            let mutation = match self.rows.get(id) {
                // Validated moments ago; a miss here means the snapshot was
                // swapped out mid-invocation, which the &mut API prevents.
                None => {
                    failures.push(RowFailure {
                        id: id.clone(),
                        error: StoreError::row_not_found(id.clone()),
                    });
                    continue;
                }
                Some(row) => Self::mutation_for(&operation.kind, row, parameters),
            };

            let mutation = match mutation {
                Some(mutation) => mutation,
                None => {
                    tracing::debug!("Skipping row '{}': mutation is a no-op", id);
                    skipped_count += 1;
                    continue;
                }
            };

            match Self::mutate_with_retry(store.as_ref(), &policy, id, mutation).await {
                Ok(()) => updated_count += 1,
                Err(error) => {
                    if error.is_transient() {
                        retryable_ids.push(id.clone());
                    }
                    failures.push(RowFailure {
                        id: id.clone(),
                        error,
                    });
                }
            }
        }

        let failed_count = failures.len();
        let can_retry = !retryable_ids.is_empty();

        let final_phase = if failed_count == 0 {
            OperationPhase::Completed
        } else {
            OperationPhase::PartiallyFailed
        };
        tracing::info!(
            "Bulk operation '{}' finished: {} updated, {} failed, {} skipped",
            operation.kind.name(),
            updated_count,
            failed_count,
            skipped_count
        );
        self.transition(final_phase);
        self.transition(OperationPhase::Idle);

        BulkOperationResult {
            updated_count,
            failed_count,
            skipped_count,
            can_retry,
            retryable_ids,
            failures,
        }
    }

    /// Attempt one mutation, retrying transient failures per policy
    async fn mutate_with_retry(
        store: &dyn RowStore,
        policy: &RetryPolicy,
        id: &str,
        mutation: RowMutation,
    ) -> Result<(), StoreError> {
        let mut attempt = 0;
        loop {
            match store.mutate_row(id, mutation.clone()).await {
                Ok(()) => {
                    if attempt > 0 {
                        tracing::debug!(
                            "Mutation of row '{}' succeeded after {} retry(ies)",
                            id,
                            attempt
                        );
                    }
                    return Ok(());
                }
                Err(error) if error.is_transient() && policy.should_retry(attempt) => {
                    tracing::debug!(
                        "Transient failure for row '{}' (attempt {}/{}): {}. Retrying...",
                        id,
                        attempt + 1,
                        policy.max_retries + 1,
                        error
                    );
                    tokio::time::sleep(policy.backoff(attempt)).await;
                    attempt += 1;
                }
                Err(error) => {
                    if error.is_transient() {
                        tracing::warn!(
                            "Max retries ({}) exceeded for row '{}': {}",
                            policy.max_retries,
                            id,
                            error
                        );
                    }
                    return Err(error);
                }
            }
        }
    }

    /// Build the per-row mutation; `None` means the row is skipped
    fn mutation_for(
        kind: &BulkOperationKind,
        row: &DataRow,
        parameters: &Value,
    ) -> Option<RowMutation> {
        match kind {
            BulkOperationKind::Delete => Some(RowMutation::Delete),
            BulkOperationKind::Archive => {
                if row.is_archived() {
                    None
                } else {
                    Some(RowMutation::Patch(json!({"archived": true})))
                }
            }
            BulkOperationKind::Reassign { target_field } => {
                let target = parameters
                    .as_object()
                    .and_then(|map| map.get("target_id"))
                    .cloned()
                    .unwrap_or(Value::Null);
                let mut patch = Map::new();
                patch.insert(target_field.clone(), target);
                Some(RowMutation::Patch(Value::Object(patch)))
            }
            BulkOperationKind::Update { fields } => {
                let mut patch = Map::new();
                if let Some(map) = parameters.as_object() {
                    for field in fields {
                        if let Some(value) = map.get(field) {
                            patch.insert(field.clone(), value.clone());
                        }
                    }
                }
                if patch.is_empty() {
                    None
                } else {
                    Some(RowMutation::Patch(Value::Object(patch)))
                }
            }
        }
    }

    fn transition(&mut self, to: OperationPhase) {
        if self.phase != to {
            tracing::debug!("Operation phase: {} -> {}", self.phase.name(), to.name());
            self.phase = to;
        }
    }
}
