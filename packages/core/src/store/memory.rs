//! In-Memory Row Store
//!
//! `MemoryRowStore` backs the unit and integration suites: a HashMap of rows
//! plus per-id scripted failures, so tests can exercise the executor's
//! retry/classification paths without a network.
//!
//! Failure scripts come in two flavors:
//!
//! - [`MemoryRowStore::fail_always`] - every mutation of the id fails
//! - [`MemoryRowStore::fail_times`] - the first `n` mutations fail, then the
//!   store behaves normally (transient-outage simulation)

use crate::models::DataRow;
use crate::store::{RowMutation, RowStore, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct FailureScript {
    error: StoreError,
    /// None = fail every time; Some(n) = fail n more times, then succeed
    remaining: Option<u32>,
}

#[derive(Debug, Default)]
struct Inner {
    rows: HashMap<String, DataRow>,
    /// Insertion order, so list_rows is deterministic
    order: Vec<String>,
    failures: HashMap<String, FailureScript>,
}

/// In-memory [`RowStore`] implementation with scripted failure injection
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    inner: Mutex<Inner>,
}

impl MemoryRowStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a test thread panicked mid-mutation;
        // the row map itself is still usable.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert or replace a row
    pub fn insert_row(&self, row: DataRow) {
        let mut inner = self.lock();
        if !inner.rows.contains_key(&row.id) {
            inner.order.push(row.id.clone());
        }
        inner.rows.insert(row.id.clone(), row);
    }

    /// Script every mutation of `id` to fail with `error`
    pub fn fail_always(&self, id: impl Into<String>, error: StoreError) {
        self.lock().failures.insert(
            id.into(),
            FailureScript {
                error,
                remaining: None,
            },
        );
    }

    /// Script the next `times` mutations of `id` to fail with `error`
    pub fn fail_times(&self, id: impl Into<String>, error: StoreError, times: u32) {
        self.lock().failures.insert(
            id.into(),
            FailureScript {
                error,
                remaining: Some(times),
            },
        );
    }

    /// Current state of a row, if present (test helper)
    pub fn row(&self, id: &str) -> Option<DataRow> {
        self.lock().rows.get(id).cloned()
    }

    /// Number of stored rows (test helper)
    pub fn row_count(&self) -> usize {
        self.lock().rows.len()
    }

    fn scripted_failure(inner: &mut Inner, id: &str) -> Option<StoreError> {
        let script = inner.failures.get_mut(id)?;
        let error = script.error.clone();
        match script.remaining {
            None => Some(error),
            Some(0) => {
                inner.failures.remove(id);
                None
            }
            Some(ref mut n) => {
                *n -= 1;
                Some(error)
            }
        }
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn list_rows(&self, row_type: &str) -> Result<Vec<DataRow>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.rows.get(id))
            .filter(|row| row.row_type == row_type)
            .cloned()
            .collect())
    }

    async fn get_row(&self, id: &str) -> Result<Option<DataRow>, StoreError> {
        Ok(self.lock().rows.get(id).cloned())
    }

    async fn mutate_row(&self, id: &str, mutation: RowMutation) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(error) = Self::scripted_failure(&mut inner, id) {
            return Err(error);
        }

        match mutation {
            RowMutation::Delete => {
                if inner.rows.remove(id).is_none() {
                    return Err(StoreError::row_not_found(id));
                }
                inner.order.retain(|existing| existing != id);
                Ok(())
            }
            RowMutation::Patch(patch) => {
                let patch = match patch {
                    Value::Object(map) => map,
                    other => {
                        return Err(StoreError::serialization(format!(
                            "PATCH payload must be a JSON object, got {other}"
                        )))
                    }
                };
                let row = inner
                    .rows
                    .get_mut(id)
                    .ok_or_else(|| StoreError::row_not_found(id))?;
                if !row.properties.is_object() {
                    row.properties = Value::Object(Default::default());
                }
                if let Some(map) = row.properties.as_object_mut() {
                    for (key, value) in patch {
                        map.insert(key, value);
                    }
                }
                row.touch();
                Ok(())
            }
        }
    }
}
