//! Plain-text rendering of a table view.

use gridline_lib::config::SortOrder;
use gridline_lib::config::TableSize;
use gridline_lib::selection::PageSelection;
use gridline_lib::table::Pagination;
use gridline_lib::table::TableView;
use gridline_lib::table::Toolbar;
use gridline_lib::table::ViewRow;

/// Pixels per character when converting column widths.
const PX_PER_CHAR: u32 = 8;

fn char_width(px: u32, size: TableSize) -> usize {
    let chars = (px / PX_PER_CHAR).max(4) as usize;
    match size {
        TableSize::Sm => chars.saturating_sub(2).max(4),
        TableSize::Default => chars,
        TableSize::Lg => chars + 2,
    }
}

fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return format!("{text:<width$}");
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

fn checkbox(selection: PageSelection) -> &'static str {
    match selection {
        PageSelection::None => "[ ]",
        PageSelection::Some => "[-]",
        PageSelection::All => "[x]",
    }
}

pub fn toolbar(toolbar: &Toolbar) -> String {
    let mut parts = Vec::new();
    if toolbar.show_search {
        let search = if toolbar.search.is_empty() {
            toolbar.search_placeholder.clone()
        } else {
            toolbar.search.clone()
        };
        parts.push(format!("search: {search}"));
    }
    if let Some(label) = toolbar.date_range.label().filter(|_| toolbar.show_date_filter) {
        parts.push(format!("dates: {label}"));
    }
    if toolbar.selected_count > 0 {
        parts.push(format!("{} selected", toolbar.selected_count));
    }
    parts.join(" | ")
}

pub fn table(view: &TableView) -> String {
    let widths: Vec<usize> = view
        .headers
        .iter()
        .map(|h| char_width(h.width, view.size))
        .collect();

    let mut lines = Vec::new();
    let mut header = Vec::new();
    if view.selectable {
        header.push(checkbox(view.page_selection).to_string());
    }
    for (cell, width) in view.headers.iter().zip(&widths) {
        let marker = match cell.sort {
            Some(SortOrder::Asc) => " ^",
            Some(SortOrder::Desc) => " v",
            None => "",
        };
        header.push(fit(&format!("{}{}", cell.label, marker), *width));
    }
    lines.push(header.join(" "));
    lines.push("-".repeat(lines[0].chars().count()));

    for row in &view.rows {
        let line = match row {
            ViewRow::Skeleton { cells } => {
                let mut line: Vec<String> = Vec::new();
                if view.selectable {
                    line.push("   ".to_string());
                }
                line.extend(widths.iter().take(*cells).map(|w| ".".repeat(*w)));
                line.join(" ")
            }
            ViewRow::NoResults { .. } => "No results.".to_string(),
            ViewRow::Data {
                selected,
                focused_cell,
                cells,
                ..
            } => {
                let mut line: Vec<String> = Vec::new();
                if view.selectable {
                    line.push(if *selected { "[x]" } else { "[ ]" }.to_string());
                }
                for (index, (text, width)) in cells.iter().zip(&widths).enumerate() {
                    if *focused_cell == Some(index) {
                        line.push(fit(&format!(">{text}"), *width));
                    } else {
                        line.push(fit(text, *width));
                    }
                }
                line.join(" ")
            }
        };
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

pub fn pagination(pagination: &Pagination) -> String {
    format!(
        "{}  ({})  rows per page: {}",
        pagination.page_label(),
        pagination.range_label(),
        pagination.state.page_size
    )
}

#[cfg(test)]
mod tests {
    use gridline_lib::table::HeaderCell;
    use gridline_lib::table::TablePhase;

    use super::*;

    fn view(rows: Vec<ViewRow>) -> TableView {
        TableView {
            phase: TablePhase::Populated,
            size: TableSize::Default,
            selectable: true,
            page_selection: PageSelection::Some,
            headers: vec![HeaderCell {
                id: "name".to_string(),
                label: "Name".to_string(),
                width: 80,
                sortable: true,
                resizable: true,
                sort: Some(SortOrder::Asc),
            }],
            rows,
        }
    }

    #[test]
    fn test_renders_rows() {
        let text = table(&view(vec![ViewRow::Data {
            index: 0,
            id: None,
            selected: true,
            focused_cell: None,
            cells: vec!["a very long name indeed".to_string()],
        }]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[-] Name ^    ");
        assert_eq!(lines[2], "[x] a very lo~");
    }

    #[test]
    fn test_no_results() {
        let text = table(&view(vec![ViewRow::NoResults { colspan: 2 }]));
        assert!(text.ends_with("No results."));
    }
}
