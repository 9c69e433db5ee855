//! Selection State
//!
//! `SelectionSet` tracks which row ids are currently marked selected in one
//! table instance. It preserves insertion order so bulk results report rows in
//! the order the user picked them, while membership checks stay O(1).
//!
//! The set is exclusively owned by the table that created it; there is no
//! cross-table sharing. Stale ids (rows deleted behind the UI's back) are
//! pruned when the owning coordinator receives a dataset refresh.

use std::collections::HashSet;

/// Insertion-ordered set of selected row identifiers
///
/// # Examples
///
/// ```rust
/// use hausverwaltung_core::models::SelectionSet;
///
/// let mut selection = SelectionSet::new();
/// selection.insert("row-1".to_string());
/// selection.insert("row-2".to_string());
/// selection.insert("row-1".to_string()); // duplicate, ignored
/// assert_eq!(selection.ids(), &["row-1".to_string(), "row-2".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ordered: Vec<String>,
    index: HashSet<String>,
}

impl SelectionSet {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an id to the selection
    ///
    /// Returns `true` if the id was newly inserted, `false` if it was already
    /// selected (insertion order is kept from the first insert).
    pub fn insert(&mut self, id: String) -> bool {
        if self.index.contains(&id) {
            return false;
        }
        self.index.insert(id.clone());
        self.ordered.push(id);
        true
    }

    /// Remove an id from the selection
    ///
    /// Returns `true` if the id was present.
    pub fn remove(&mut self, id: &str) -> bool {
        if !self.index.remove(id) {
            return false;
        }
        self.ordered.retain(|existing| existing != id);
        true
    }

    /// Toggle an id (checkbox click semantics)
    ///
    /// Returns `true` if the id is selected after the toggle.
    pub fn toggle(&mut self, id: String) -> bool {
        if self.index.contains(&id) {
            self.remove(&id);
            false
        } else {
            self.insert(id);
            true
        }
    }

    /// Add every id in the given list (select-all semantics)
    ///
    /// Already-selected ids keep their original position.
    pub fn select_all<I: IntoIterator<Item = String>>(&mut self, ids: I) {
        for id in ids {
            self.insert(id);
        }
    }

    /// Remove all ids
    pub fn clear(&mut self) {
        self.ordered.clear();
        self.index.clear();
    }

    /// Whether the id is currently selected
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Number of selected ids
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether the selection is empty
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Selected ids in insertion order
    pub fn ids(&self) -> &[String] {
        &self.ordered
    }

    /// Drop every id for which `exists` returns false
    ///
    /// Called on dataset refresh to uphold the invariant that selected ids
    /// reference rows that still exist. Returns the number of pruned ids.
    pub fn prune<F>(&mut self, exists: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let before = self.ordered.len();
        self.ordered.retain(|id| exists(id));
        self.index.retain(|id| exists(id));
        before - self.ordered.len()
    }
}
