//! Coordinator Configuration
//!
//! Tunables for the selection/bulk-operation machinery. Values deserialize
//! from the application config file; every field has a default so an empty
//! config object is valid.

use crate::operations::RetryPolicy;
use serde::Deserialize;
use std::time::Duration;

/// Rows consuming 50% above the prior period get a warning badge in the
/// finance views. Presentation policy, not part of the core contract.
pub const HIGH_CONSUMPTION_WARNING_RATIO: f64 = 1.5;

/// Minimum touch-target edge length used by the mobile table layouts.
/// Presentation policy, not part of the core contract.
pub const MIN_TOUCH_TARGET_PX: u32 = 44;

/// Configuration for a [`BulkCoordinator`](crate::services::BulkCoordinator)
///
/// # Examples
///
/// ```rust
/// use hausverwaltung_core::config::CoordinatorConfig;
///
/// let config: CoordinatorConfig = serde_json::from_str("{}").unwrap();
/// assert_eq!(config.debounce_window_ms, 50);
/// assert_eq!(config.max_batch_size, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Quiet period before queued selection events are applied
    pub debounce_window_ms: u64,

    /// Pending-event count that forces an immediate flush
    pub max_batch_size: usize,

    /// Retry schedule for transient store failures during bulk execution
    pub retry: RetryPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: 50,
            max_batch_size: 100,
            retry: RetryPolicy::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Debounce window as a `Duration`
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.debounce_window(), Duration::from_millis(50));
        assert_eq!(config.max_batch_size, 100);
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_partial_deserialization() {
        let config: CoordinatorConfig =
            serde_json::from_str(r#"{"max_batch_size": 10, "retry": {"max_retries": 0}}"#).unwrap();
        assert_eq!(config.max_batch_size, 10);
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.debounce_window_ms, 50);
    }
}
