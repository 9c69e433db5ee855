//! Data Models
//!
//! This module contains the core data structures used throughout the
//! Hausverwaltung core:
//!
//! - `DataRow` - Read-only view of a backing table row (tenant, apartment, ...)
//! - `SelectionSet` - Insertion-ordered set of selected row ids, one per table
//! - Template document tree (`TemplateDocument`, `TemplateNode`)
//!
//! All entities use the pure JSON approach with entity-specific data stored in
//! the `properties` field of the universal row shape.

mod row;
mod selection;
mod template;

pub use row::DataRow;
pub use selection::SelectionSet;
pub use template::{MentionAttrs, TemplateDocument, TemplateNode, TextMark, DOC_TYPE};
