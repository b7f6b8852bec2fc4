//! Render-ready view of a table

use crate::config::SortOrder;
use crate::config::TableSize;
use crate::model::RowId;
use crate::selection::PageSelection;

/// Lifecycle of the rows shown by a table.
///
/// No phase is terminal: any change of page, sort, search or filter (or an
/// explicit refetch) moves back to `Loading`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TablePhase {
    /// Nothing fetched yet.
    #[default]
    Idle,
    Loading,
    Populated,
    Empty,
}

impl TablePhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// A visible column header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub id: String,
    pub label: String,
    /// Width in pixels.
    pub width: u32,
    pub sortable: bool,
    pub resizable: bool,
    /// Direction when this column is the active sort.
    pub sort: Option<SortOrder>,
}

/// A body row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewRow {
    /// Placeholder shown while loading.
    Skeleton { cells: usize },
    /// Single row spanning every column when nothing matched.
    NoResults { colspan: usize },
    Data {
        /// Position on the current page.
        index: usize,
        id: Option<RowId>,
        selected: bool,
        /// Column index holding keyboard focus.
        focused_cell: Option<usize>,
        /// Cell text in column order.
        cells: Vec<String>,
    },
}

/// Everything needed to draw the table body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub phase: TablePhase,
    pub size: TableSize,
    /// Whether a checkbox column precedes the headers.
    pub selectable: bool,
    /// State of the header checkbox.
    pub page_selection: PageSelection,
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<ViewRow>,
}

impl TableView {
    /// Column span including the checkbox column.
    pub fn colspan(&self) -> usize {
        self.headers.len() + usize::from(self.selectable)
    }

    /// Data rows only.
    pub fn data_rows(&self) -> impl Iterator<Item = &ViewRow> {
        self.rows
            .iter()
            .filter(|row| matches!(row, ViewRow::Data { .. }))
    }

    pub fn is_empty(&self) -> bool {
        self.rows
            .iter()
            .any(|row| matches!(row, ViewRow::NoResults { .. }))
    }
}
