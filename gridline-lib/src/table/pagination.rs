//! Pagination model

/// 0-based page index and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: usize,
}

impl PaginationState {
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size: page_size.max(1),
        }
    }
}

/// Pager state derived from the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub state: PaginationState,
    /// Rows across all pages.
    pub total: usize,
    pub page_size_options: Vec<usize>,
}

impl Pagination {
    pub fn new(state: PaginationState, total: usize, page_size_options: Vec<usize>) -> Self {
        Self {
            state,
            total,
            page_size_options,
        }
    }

    /// `ceil(total / page_size)`, at least 1.
    pub fn total_pages(&self) -> usize {
        total_pages(self.total, self.state.page_size)
    }

    /// Clamps an index into `[0, total_pages - 1]`.
    pub fn clamp(&self, page_index: usize) -> usize {
        page_index.min(self.total_pages() - 1)
    }

    pub fn can_previous(&self) -> bool {
        self.state.page_index > 0
    }

    pub fn can_next(&self) -> bool {
        self.state.page_index + 1 < self.total_pages()
    }

    pub fn first(&self) -> usize {
        0
    }

    pub fn previous(&self) -> usize {
        self.clamp(self.state.page_index.saturating_sub(1))
    }

    pub fn next(&self) -> usize {
        self.clamp(self.state.page_index + 1)
    }

    pub fn last(&self) -> usize {
        self.total_pages() - 1
    }

    /// 1-based row range shown, e.g. `11-20 of 25`.
    pub fn range_label(&self) -> String {
        if self.total == 0 {
            return "0 of 0".to_string();
        }
        let start = self.state.page_index * self.state.page_size + 1;
        let end = (start + self.state.page_size - 1).min(self.total);
        format!("{start}-{end} of {}", self.total)
    }

    /// e.g. `Page 2 of 3`.
    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.state.page_index + 1, self.total_pages())
    }
}

/// `ceil(total / page_size)`, at least 1.
pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}
