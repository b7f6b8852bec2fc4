//! Row selection tracking.
//!
//! The authoritative selection is a set of [`RowId`]s, so a row stays
//! selected while the user pages, sorts or searches away from it. The
//! page-relative view (`page index -> selected`) is derived from the rows
//! currently loaded.

use std::collections::BTreeMap;
use std::collections::HashSet;

use indexmap::IndexSet;
use log::debug;

use crate::model::RowId;
use crate::model::TableRow;

/// Page index -> selected. Indices missing from the map are not selected.
pub type RowSelection = BTreeMap<usize, bool>;

/// A new page-relative selection, or a function computing one.
pub enum RowSelectionChange {
    Replace(RowSelection),
    Update(Box<dyn FnOnce(&RowSelection) -> RowSelection + Send>),
}

impl RowSelectionChange {
    /// Wraps an updater function.
    pub fn update(f: impl FnOnce(&RowSelection) -> RowSelection + Send + 'static) -> Self {
        Self::Update(Box::new(f))
    }

    fn resolve(self, current: &RowSelection) -> RowSelection {
        match self {
            Self::Replace(next) => next,
            Self::Update(f) => f(current),
        }
    }
}

impl std::fmt::Debug for RowSelectionChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replace(map) => f.debug_tuple("Replace").field(map).finish(),
            Self::Update(_) => f.write_str("Update(..)"),
        }
    }
}

/// Explicit selection change for the rows currently visible.
///
/// Ids outside `visible` are ignored; visible ids named in neither set keep
/// their state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionUpdate {
    pub selected: HashSet<RowId>,
    pub deselected: HashSet<RowId>,
    pub visible: HashSet<RowId>,
}

impl SelectionUpdate {
    /// Builds an update from a page-relative map: rows marked `true` are
    /// selected, every other visible row is deselected.
    pub fn from_page<T: TableRow>(rows: &[T], id_field: &str, page: &RowSelection) -> Self {
        let mut update = Self::default();
        for (index, row) in rows.iter().enumerate() {
            let Some(id) = row.row_id(id_field) else {
                continue;
            };
            if page.get(&index).copied().unwrap_or(false) {
                update.selected.insert(id.clone());
            } else {
                update.deselected.insert(id.clone());
            }
            update.visible.insert(id);
        }
        update
    }
}

/// Header checkbox state for the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelection {
    None,
    Some,
    All,
}

/// Identity-keyed selection.
///
/// # Example
///
/// ```
/// use gridline_lib::model::{Record, RowId};
/// use gridline_lib::selection::SelectionTracker;
///
/// let rows = vec![Record::empty().set("id", 1), Record::empty().set("id", 2)];
/// let mut tracker = SelectionTracker::new("id");
///
/// tracker.toggle(&rows, 1);
/// assert!(tracker.is_selected(&RowId::Num(2)));
/// assert_eq!(tracker.selected_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SelectionTracker {
    id_field: String,
    selected: IndexSet<RowId>,
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self::new("id")
    }
}

impl SelectionTracker {
    /// Creates an empty tracker reading ids from `id_field`.
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            selected: IndexSet::new(),
        }
    }

    /// Field rows are identified by.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Selected ids in selection order, across all pages.
    pub fn selected_ids(&self) -> impl Iterator<Item = &RowId> {
        self.selected.iter()
    }

    /// Total number of selected rows, across all pages.
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Returns `true` when nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Returns `true` if `id` is selected.
    pub fn is_selected(&self, id: &RowId) -> bool {
        self.selected.contains(id)
    }

    /// Page-relative selection for `rows`.
    pub fn row_selection<T: TableRow>(&self, rows: &[T]) -> RowSelection {
        rows.iter()
            .enumerate()
            .filter(|(_, row)| {
                row.row_id(&self.id_field)
                    .is_some_and(|id| self.selected.contains(&id))
            })
            .map(|(index, _)| (index, true))
            .collect()
    }

    /// Applies a page-relative change computed by the table.
    pub fn handle_row_selection_change<T: TableRow>(&mut self, rows: &[T], change: RowSelectionChange) {
        let current = self.row_selection(rows);
        let next = change.resolve(&current);
        let update = SelectionUpdate::from_page(rows, &self.id_field, &next);
        self.apply(update);
    }

    /// Applies an explicit update.
    pub fn apply(&mut self, update: SelectionUpdate) {
        let SelectionUpdate {
            selected,
            deselected,
            visible,
        } = update;

        for id in deselected.iter().filter(|id| visible.contains(*id)) {
            if !selected.contains(id) {
                self.selected.shift_remove(id);
            }
        }
        for id in selected {
            if visible.contains(&id) {
                self.selected.insert(id);
            } else {
                debug!("ignoring selection of row {} that is not visible", id);
            }
        }
    }

    /// Deselects the row at `page_index`. Returns `true` if it was selected.
    pub fn handle_row_deselection<T: TableRow>(&mut self, rows: &[T], page_index: usize) -> bool {
        rows.get(page_index)
            .and_then(|row| row.row_id(&self.id_field))
            .is_some_and(|id| self.selected.shift_remove(&id))
    }

    /// Toggles the row at `page_index`. Returns its new state.
    pub fn toggle<T: TableRow>(&mut self, rows: &[T], page_index: usize) -> bool {
        let Some(id) = rows.get(page_index).and_then(|row| row.row_id(&self.id_field)) else {
            return false;
        };
        if self.selected.shift_remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    /// Selects every row on the page.
    pub fn select_page<T: TableRow>(&mut self, rows: &[T]) {
        let all = (0..rows.len()).map(|index| (index, true)).collect();
        self.handle_row_selection_change(rows, RowSelectionChange::Replace(all));
    }

    /// Deselects every row on the page, leaving other pages alone.
    pub fn deselect_page<T: TableRow>(&mut self, rows: &[T]) {
        self.handle_row_selection_change(rows, RowSelectionChange::Replace(RowSelection::new()));
    }

    /// Header checkbox state for the page.
    pub fn page_selection<T: TableRow>(&self, rows: &[T]) -> PageSelection {
        let selected = self.row_selection(rows).len();
        match selected {
            0 => PageSelection::None,
            n if n == rows.len() => PageSelection::All,
            _ => PageSelection::Some,
        }
    }

    /// Forgets every selection.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Current-page rows that are selected.
    pub fn selected_items<T: TableRow>(&self, rows: &[T]) -> Vec<T> {
        rows.iter()
            .filter(|row| {
                row.row_id(&self.id_field)
                    .is_some_and(|id| self.selected.contains(&id))
            })
            .cloned()
            .collect()
    }

    /// Every row on the current page.
    pub fn all_items<T: TableRow>(&self, rows: &[T]) -> Vec<T> {
        rows.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;

    fn page(ids: std::ops::Range<i64>) -> Vec<Record> {
        ids.map(|id| Record::empty().set("id", id).set("name", format!("row {id}")))
            .collect()
    }

    fn ids(tracker: &SelectionTracker) -> Vec<RowId> {
        let mut ids: Vec<RowId> = tracker.selected_ids().cloned().collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_derivation_follows_identity() {
        let rows = page(1..4);
        let mut tracker = SelectionTracker::new("id");
        tracker.toggle(&rows, 2);

        let reordered = vec![rows[2].clone(), rows[0].clone(), rows[1].clone()];
        assert_eq!(tracker.row_selection(&reordered), RowSelection::from([(0, true)]));
    }

    #[test]
    fn test_select_then_deselect_page_restores_set() {
        let first = page(1..4);
        let second = page(4..7);
        let mut tracker = SelectionTracker::new("id");
        tracker.toggle(&first, 0);
        tracker.toggle(&second, 1);
        let before = ids(&tracker);

        tracker.select_page(&second);
        assert_eq!(tracker.selected_count(), 4);
        assert_eq!(tracker.page_selection(&second), PageSelection::All);

        tracker.deselect_page(&second);
        assert_eq!(ids(&tracker), vec![RowId::Num(1)]);

        tracker.toggle(&second, 1);
        assert_eq!(ids(&tracker), before);
    }

    #[test]
    fn test_absent_entries_are_deselected() {
        let rows = page(1..4);
        let mut tracker = SelectionTracker::new("id");
        tracker.select_page(&rows);

        tracker.handle_row_selection_change(&rows, RowSelectionChange::Replace(RowSelection::from([(1, true)])));

        assert_eq!(ids(&tracker), vec![RowId::Num(2)]);
        assert_eq!(tracker.page_selection(&rows), PageSelection::Some);
    }

    #[test]
    fn test_updater_function() {
        let rows = page(1..4);
        let mut tracker = SelectionTracker::new("id");
        tracker.toggle(&rows, 0);

        tracker.handle_row_selection_change(
            &rows,
            RowSelectionChange::update(|current| {
                let mut next = current.clone();
                next.insert(2, true);
                next
            }),
        );

        assert_eq!(ids(&tracker), vec![RowId::Num(1), RowId::Num(3)]);
    }

    #[test]
    fn test_explicit_update_ignores_invisible_ids() {
        let mut tracker = SelectionTracker::new("id");
        tracker.apply(SelectionUpdate {
            selected: HashSet::from([RowId::Num(1), RowId::Num(99)]),
            deselected: HashSet::new(),
            visible: HashSet::from([RowId::Num(1), RowId::Num(2)]),
        });
        assert_eq!(ids(&tracker), vec![RowId::Num(1)]);
    }

    #[test]
    fn test_single_deselection_and_queries() {
        let rows = page(1..4);
        let mut tracker = SelectionTracker::new("id");
        tracker.select_page(&rows);

        assert!(tracker.handle_row_deselection(&rows, 1));
        assert!(!tracker.handle_row_deselection(&rows, 1));
        assert!(!tracker.handle_row_deselection(&rows, 10));

        let selected = tracker.selected_items(&rows);
        assert_eq!(selected.len(), 2);
        assert_eq!(tracker.all_items(&rows).len(), 3);

        tracker.clear();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_rows_without_id_are_skipped() {
        let rows = vec![Record::empty().set("name", "orphan")];
        let mut tracker = SelectionTracker::new("id");
        assert!(!tracker.toggle(&rows, 0));
        tracker.select_page(&rows);
        assert_eq!(tracker.selected_count(), 0);
    }
}
