//! Column definitions

use crate::layout::SizeBounds;

/// A column of a data table.
///
/// # Example
///
/// ```
/// use gridline_lib::table::ColumnDef;
///
/// let column = ColumnDef::new("email", "E-mail").size(240).min_size(120);
/// assert_eq!(column.bounds.size, 240);
/// assert!(column.sortable);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub id: String,
    /// Header label, also used for export headers.
    pub header: String,
    pub bounds: SizeBounds,
    pub sortable: bool,
    /// Whether the view-options menu may hide it.
    pub hideable: bool,
    pub resizable: bool,
    /// Included in exports.
    pub exportable: bool,
    /// Spreadsheet width in characters.
    pub export_width: Option<f64>,
}

impl ColumnDef {
    pub fn new(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            bounds: SizeBounds::default(),
            sortable: true,
            hideable: true,
            resizable: true,
            exportable: true,
            export_width: None,
        }
    }

    /// Declared width in pixels.
    pub fn size(mut self, size: u32) -> Self {
        self.bounds = SizeBounds { size, ..self.bounds }.with_min(self.bounds.min);
        self
    }

    pub fn min_size(mut self, min: u32) -> Self {
        self.bounds = self.bounds.with_min(min);
        self
    }

    pub fn max_size(mut self, max: u32) -> Self {
        self.bounds = self.bounds.with_max(max);
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn hideable(mut self, hideable: bool) -> Self {
        self.hideable = hideable;
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn exportable(mut self, exportable: bool) -> Self {
        self.exportable = exportable;
        self
    }

    pub fn export_width(mut self, wch: f64) -> Self {
        self.export_width = Some(wch);
        self
    }
}

/// Applies a stored order to the declared columns.
///
/// Unknown ids are skipped and columns missing from `order` keep their
/// declared position after the ordered ones. An empty order is the
/// declared order.
pub fn ordered_columns<'a>(columns: &'a [ColumnDef], order: &[String]) -> Vec<&'a ColumnDef> {
    let mut result: Vec<&ColumnDef> = order
        .iter()
        .filter_map(|id| columns.iter().find(|c| &c.id == id))
        .collect();
    for column in columns {
        if !result.iter().any(|c| c.id == column.id) {
            result.push(column);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(columns: Vec<&ColumnDef>) -> Vec<&str> {
        columns.into_iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_ordered_columns() {
        let columns = vec![
            ColumnDef::new("id", "ID"),
            ColumnDef::new("name", "Name"),
            ColumnDef::new("email", "E-mail"),
        ];
        assert_eq!(ids(ordered_columns(&columns, &[])), vec!["id", "name", "email"]);
        let order = vec!["email".to_string(), "gone".to_string(), "id".to_string()];
        assert_eq!(ids(ordered_columns(&columns, &order)), vec!["email", "id", "name"]);
    }

    #[test]
    fn test_size_respects_bounds() {
        let column = ColumnDef::new("id", "ID").min_size(60).size(10);
        assert_eq!(column.bounds.size, 60);
    }
}
