//! RowStore Trait - Backend Abstraction Layer
//!
//! This module defines the `RowStore` trait that abstracts backend row
//! operations. The trait enables the coordinator to run unchanged against the
//! production REST gateway or the in-memory test store.
//!
//! # Examples
//!
//! ```rust
//! use hausverwaltung_core::store::{MemoryRowStore, RowMutation, RowStore};
//! use hausverwaltung_core::models::DataRow;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let store: Arc<dyn RowStore> = Arc::new(MemoryRowStore::new());
//! # Ok(())
//! # }
//! ```

use crate::models::DataRow;
use crate::store::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// One mutation applied to a single row
#[derive(Debug, Clone, PartialEq)]
pub enum RowMutation {
    /// Remove the row
    Delete,

    /// Shallow-merge the given JSON object into the row's properties
    /// (mirrors the backend's PATCH semantics)
    Patch(Value),
}

/// Backend abstraction for row reads and mutations
///
/// Implementations must keep mutations independent per row: a failure for one
/// id must not affect previously applied mutations.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// List all rows of the given table type
    async fn list_rows(&self, row_type: &str) -> Result<Vec<DataRow>, StoreError>;

    /// Fetch a single row by id
    async fn get_row(&self, id: &str) -> Result<Option<DataRow>, StoreError>;

    /// Apply one mutation to one row
    async fn mutate_row(&self, id: &str, mutation: RowMutation) -> Result<(), StoreError>;
}
