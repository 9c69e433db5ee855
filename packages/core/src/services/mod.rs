//! Business Services
//!
//! This module contains the two core services of the Hausverwaltung core:
//!
//! - `BulkCoordinator` - selection state and bulk mutation execution for one
//!   table instance
//! - `template_parser` - defensive parsing/recovery of persisted template
//!   content plus variable extraction
//!
//! Services coordinate between the store layer and the UI shell, implementing
//! business rules while keeping all failure reporting inside result objects.

pub mod bulk_coordinator;
pub mod error;
pub mod template_parser;

pub use bulk_coordinator::{
    BulkCoordinator, BulkOperationResult, OperationPhase, PerformOutcome, RowFailure,
    ValidationResult,
};
pub use error::CoordinatorError;
pub use template_parser::{
    extract_template_variables, parse_template_content, serialize_template_content, ParseResult,
    VariableExtraction,
};
