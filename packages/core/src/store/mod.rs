//! Backend Gateway Layer
//!
//! This module abstracts the BaaS/REST backend behind the [`RowStore`] trait so
//! the coordinator's business logic never touches transport details. The
//! production implementation wraps HTTP list/patch/delete endpoints; this crate
//! ships [`MemoryRowStore`], an in-memory implementation with scripted failure
//! injection used by the test suites.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async; the coordinator suspends only at
//!    these boundaries.
//! 2. **Per-row mutations**: The coordinator needs independent per-row
//!    success/failure, so the trait mutates one row per call rather than
//!    hiding a batch transaction.
//! 3. **Classified errors**: [`StoreError::is_transient`] is the single source
//!    of truth for the retryable/permanent split.

mod error;
mod memory;
mod row_store;

pub use error::StoreError;
pub use memory::MemoryRowStore;
pub use row_store::{RowMutation, RowStore};
