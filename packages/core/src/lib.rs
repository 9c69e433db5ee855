//! Hausverwaltung Core Business Logic Layer
//!
//! This crate provides the table-operation and template-content core for the
//! Hausverwaltung property management application. It is a pure library: the
//! UI shell (tables, dialogs, editors) renders state and forwards events, while
//! every decision about selection, validation, bulk mutation, and template
//! recovery lives here.
//!
//! # Architecture
//!
//! - **Instance-scoped state**: Each table owns one [`BulkCoordinator`] with its
//!   own selection. No global stores, no hidden cross-component coupling.
//! - **Result objects, not exceptions**: Row-level and parse-level failures are
//!   encoded in returned values ([`ValidationResult`], [`BulkOperationResult`],
//!   [`ParseResult`]). `Result::Err` is reserved for protocol misuse.
//! - **Store seam**: Backend mutations go through the [`RowStore`] trait; the
//!   REST/BaaS transport behind it is out of scope for this crate.
//!
//! # Modules
//!
//! - [`models`] - Data structures (DataRow, SelectionSet, template document tree)
//! - [`operations`] - Operation descriptors, coalescing queue, retry policy
//! - [`services`] - Business services (BulkCoordinator, template parser/recovery)
//! - [`store`] - Backend gateway trait with in-memory implementation
//! - [`config`] - Tunables (debounce window, batch size, retry policy)

pub mod config;
pub mod models;
pub mod operations;
pub mod services;
pub mod store;
pub mod telemetry;

// Re-export commonly used types
pub use config::CoordinatorConfig;
pub use models::*;
pub use operations::{BulkOperation, BulkOperationKind, ParameterSpec, RetryPolicy};
pub use services::*;
pub use store::{MemoryRowStore, RowMutation, RowStore, StoreError};
