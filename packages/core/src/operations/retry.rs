//! Retry Policy
//!
//! Transient store failures (timeouts, dropped connections) are retried with
//! exponential backoff. The schedule lives in an explicit policy object so the
//! executor's control flow stays free of ad hoc timer plumbing and tests can
//! run with a near-zero delay.
//!
//! Permanent failures (validation, permission, missing rows) are never routed
//! through this policy; classification happens via
//! [`StoreError::is_transient`](crate::store::StoreError::is_transient).

use serde::Deserialize;
use std::time::Duration;

/// Exponential-backoff retry schedule for transient failures
///
/// # Examples
///
/// ```rust
/// use hausverwaltung_core::operations::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_retries, 3);
/// // 10ms, 20ms, 40ms, ...
/// assert_eq!(policy.backoff(0), Duration::from_millis(10));
/// assert_eq!(policy.backoff(2), Duration::from_millis(40));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum retry attempts after the initial try (0 = no retries)
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each subsequent attempt
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 10,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 0,
        }
    }

    /// Whether another retry is allowed after `attempt` retries so far
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Backoff delay before retry number `attempt` (0-based)
    ///
    /// Exponential: `base * 2^attempt`, saturating instead of overflowing for
    /// absurd attempt counts.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(10));
        assert_eq!(policy.backoff(1), Duration::from_millis(20));
        assert_eq!(policy.backoff(3), Duration::from_millis(80));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn test_disabled_never_retries() {
        let policy = RetryPolicy::disabled();
        assert!(!policy.should_retry(0));
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy {
            max_retries: 100,
            base_delay_ms: u64::MAX,
        };
        // Must not panic on overflow
        let _ = policy.backoff(90);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let policy: RetryPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, RetryPolicy::default());

        let policy: RetryPolicy = serde_json::from_str(r#"{"max_retries": 1}"#).unwrap();
        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.base_delay_ms, 10);
    }
}
