//! Row Data Structures
//!
//! This module defines the universal `DataRow` struct shared by every table the
//! coordinator operates on (tenants, apartments, houses, finance entries).
//!
//! # Architecture
//!
//! - **Universal row**: Single struct represents all table row types
//! - **Pure JSON properties**: All entity-specific data in the `properties` field
//! - **Externally owned**: The coordinator reads rows but never mutates them;
//!   changes go through the store and come back via a dataset refresh
//!
//! # Examples
//!
//! ```rust
//! use hausverwaltung_core::models::DataRow;
//! use serde_json::json;
//!
//! let tenant = DataRow::new(
//!     "tenant".to_string(),
//!     json!({
//!         "name": "Erika Mustermann",
//!         "apartment_id": "apt-12",
//!         "archived": false
//!     }),
//! );
//! assert_eq!(tenant.row_type, "tenant");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Universal row structure for all table types in Hausverwaltung.
///
/// # Fields
///
/// - `id`: Unique identifier (UUID unless the backend supplied its own)
/// - `row_type`: Table discriminator (e.g., "tenant", "apartment", "finance_entry")
/// - `properties`: JSON object containing all entity-specific fields
/// - `created_at` / `modified_at`: Timestamps maintained by the storage layer
///
/// The coordinator treats rows as read-only snapshots of backend state. It
/// inspects `properties` to evaluate operation preconditions but never writes
/// to them directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    /// Unique identifier
    pub id: String,

    /// Table discriminator (tenant, apartment, house, finance_entry, ...)
    pub row_type: String,

    /// Entity-specific fields as a JSON object
    pub properties: Value,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl DataRow {
    /// Create a new row with an auto-generated UUID
    pub fn new(row_type: String, properties: Value) -> Self {
        Self::new_with_id(Uuid::new_v4().to_string(), row_type, properties)
    }

    /// Create a new row with an explicit ID (backend-assigned identifiers)
    pub fn new_with_id(id: String, row_type: String, properties: Value) -> Self {
        let now = Utc::now();
        Self {
            id,
            row_type,
            properties,
            created_at: now,
            modified_at: now,
        }
    }

    /// Look up a property by key
    ///
    /// Returns `None` if `properties` is not an object or the key is absent.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_object().and_then(|map| map.get(key))
    }

    /// Whether the row has a settable field with the given key
    ///
    /// Used by reassign preconditions: the key must exist on the row, even if
    /// its current value is `null`.
    pub fn has_property(&self, key: &str) -> bool {
        self.property(key).is_some()
    }

    /// Whether the row is marked archived (`properties.archived == true`)
    pub fn is_archived(&self) -> bool {
        self.property("archived").and_then(Value::as_bool) == Some(true)
    }

    /// Update the modification timestamp
    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}
