//! Selection Event Coalescing
//!
//! Rapid checkbox interaction on a large (possibly virtualized) table must not
//! re-render per click, so selection events are queued and applied as one
//! batch. This module implements that as an explicit queue with an internal
//! deadline rather than a UI-framework timer, which keeps the behavior
//! deterministic under test:
//!
//! - Each pushed event re-arms the deadline to `now + debounce_window`
//!   (debounce semantics: a burst settles before it is applied).
//! - Reaching `max_batch_size` pending events forces an immediate flush so an
//!   unbounded burst cannot starve the table of updates.
//! - [`CoalescingQueue::flush_into`] applies pending events synchronously in
//!   arrival order; coalescing changes timing, never the final state.

use crate::models::SelectionSet;
use std::time::{Duration, Instant};

/// One queued selection mutation, applied in arrival order on flush
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// Mark a row selected
    Select(String),
    /// Mark a row unselected
    Deselect(String),
    /// Flip a row's selected state (checkbox click)
    Toggle(String),
    /// Select every id in the list (header checkbox)
    SelectAll(Vec<String>),
    /// Clear the entire selection
    Clear,
}

impl SelectionEvent {
    /// Apply this event to a selection set
    pub fn apply(self, selection: &mut SelectionSet) {
        match self {
            Self::Select(id) => {
                selection.insert(id);
            }
            Self::Deselect(id) => {
                selection.remove(&id);
            }
            Self::Toggle(id) => {
                selection.toggle(id);
            }
            Self::SelectAll(ids) => selection.select_all(ids),
            Self::Clear => selection.clear(),
        }
    }
}

/// Debounced batching queue for selection events
///
/// # Examples
///
/// ```rust
/// use hausverwaltung_core::models::SelectionSet;
/// use hausverwaltung_core::operations::{CoalescingQueue, SelectionEvent};
/// use std::time::Duration;
///
/// let mut queue = CoalescingQueue::new(Duration::from_millis(50), 100);
/// let mut selection = SelectionSet::new();
///
/// queue.push(SelectionEvent::Select("1".to_string()));
/// queue.push(SelectionEvent::Toggle("2".to_string()));
/// queue.flush_into(&mut selection);
///
/// assert!(selection.contains("1"));
/// assert!(selection.contains("2"));
/// ```
#[derive(Debug)]
pub struct CoalescingQueue {
    pending: Vec<SelectionEvent>,
    deadline: Option<Instant>,
    debounce_window: Duration,
    max_batch_size: usize,
}

impl CoalescingQueue {
    /// Create a queue with the given debounce window and forced-flush size
    ///
    /// A `max_batch_size` of 0 is treated as 1 (every event flushes).
    pub fn new(debounce_window: Duration, max_batch_size: usize) -> Self {
        Self {
            pending: Vec::new(),
            deadline: None,
            debounce_window,
            max_batch_size: max_batch_size.max(1),
        }
    }

    /// Enqueue an event
    ///
    /// Returns `true` when the batch hit `max_batch_size` and must be flushed
    /// now; otherwise the deadline is re-armed and the caller may wait.
    pub fn push(&mut self, event: SelectionEvent) -> bool {
        self.pending.push(event);
        if self.pending.len() >= self.max_batch_size {
            self.deadline = Some(Instant::now());
            return true;
        }
        self.deadline = Some(Instant::now() + self.debounce_window);
        false
    }

    /// Whether any events are waiting to be applied
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of queued events
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the debounce deadline has passed as of `now`
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Apply all pending events to `selection` in arrival order
    ///
    /// Returns the number of events applied. Safe to call at any time; the
    /// deadline is cleared.
    pub fn flush_into(&mut self, selection: &mut SelectionSet) -> usize {
        let applied = self.pending.len();
        for event in self.pending.drain(..) {
            event.apply(selection);
        }
        self.deadline = None;
        applied
    }
}
