//! Table orchestrator
//!
//! [`DataTable`] wires the query, layout, selection and export modules to a
//! row source. Each aspect of the query (pagination, sorting, search,
//! filters) is computed either by the server or locally, as chosen by the
//! `manual_*` flags of [`TableConfig`].

mod bindings;
mod column;
mod keyboard;
mod pagination;
mod toolbar;
mod view;
mod view_options;

pub use column::*;
pub use keyboard::*;
pub use pagination::*;
pub use toolbar::*;
pub use view::*;
pub use view_options::*;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Instant;

use indexmap::IndexMap;
use log::debug;
use log::warn;

use self::bindings::UrlBindings;
use crate::api::ListParams;
use crate::api::ListSource;
use crate::api::MemorySource;
use crate::api::apply_query;
use crate::config::TableConfig;
use crate::error::ApiError;
use crate::error::ExportError;
use crate::export::ColumnWidth;
use crate::export::DEFAULT_EXCEL_COLUMN_WIDTH;
use crate::export::ExportArtifact;
use crate::export::ExportFormat;
use crate::export::ExportGuard;
use crate::export::ExportJob;
use crate::export::ExportOptions;
use crate::export::ExportSources;
use crate::export::ExportTarget;
use crate::export::Notifier;
use crate::export::SortSpec;
use crate::export::cell_text;
use crate::export::export_data;
use crate::layout::ColumnLayoutManager;
use crate::layout::ColumnSizing;
use crate::model::Record;
use crate::model::RowId;
use crate::model::TableRow;
use crate::query;
use crate::query::Location;
use crate::query::UrlStateContext;
use crate::selection::RowSelectionChange;
use crate::selection::SelectionTracker;
use crate::storage::Storage;

/// Page size used when every row has to be pulled from a paged source.
pub const FETCH_ALL_PAGE_SIZE: usize = 100;

/// What the table is currently asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    /// 0-based.
    pub page_index: usize,
    pub page_size: usize,
    pub sort: Option<SortSpec>,
    pub search: String,
    pub date_range: DateRange,
    /// Feature filters such as `status`.
    pub filters: IndexMap<String, String>,
}

impl TableQuery {
    fn initial(config: &TableConfig) -> Self {
        Self {
            page_index: 0,
            page_size: config.default_page_size(),
            sort: default_sort(config),
            search: String::new(),
            date_range: DateRange::default(),
            filters: IndexMap::new(),
        }
    }
}

fn default_sort(config: &TableConfig) -> Option<SortSpec> {
    (!config.default_sort_by.is_empty())
        .then(|| SortSpec::new(config.default_sort_by.clone(), config.default_sort_order))
}

/// Builder for [`DataTable`].
pub struct DataTableBuilder<T> {
    columns: Vec<ColumnDef>,
    config: TableConfig,
    storage: Option<Storage>,
    url: Option<UrlStateContext>,
    source: Option<Arc<dyn ListSource<T>>>,
    entity_name: String,
    id_field: String,
}

impl<T: TableRow> DataTableBuilder<T> {
    pub fn config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Storage for the column layout. Defaults to in-memory.
    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Binds the table to query parameters of `ctx`.
    pub fn url_context(mut self, ctx: &UrlStateContext) -> Self {
        self.url = Some(ctx.clone());
        self
    }

    pub fn source(mut self, source: impl ListSource<T> + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn shared_source(mut self, source: Arc<dyn ListSource<T>>) -> Self {
        self.source = Some(source);
        self
    }

    /// Rows held in memory, searched across every column.
    pub fn rows(self, rows: Vec<T>) -> Self {
        let source = MemorySource::new(rows)
            .with_id_field(self.id_field.clone())
            .with_search_fields(self.columns.iter().map(|c| c.id.clone()).collect());
        self.source(source)
    }

    /// Name used for export files and notifications, e.g. `users`.
    pub fn entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = name.into();
        self
    }

    /// Field rows are identified by. Defaults to `id`.
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Loads the persisted layout and binds URL state. Does not fetch rows.
    pub async fn build(self) -> DataTable<T> {
        let Self {
            columns,
            config,
            storage,
            url,
            source,
            entity_name,
            id_field,
        } = self;

        let storage = storage.unwrap_or_else(Storage::in_memory);
        let mut layout = ColumnLayoutManager::load(config.column_resizing_table_id.as_deref(), storage).await;
        layout.init_columns(columns.iter().map(|c| (c.id.as_str(), c.bounds)));
        restore_column_order(&mut layout).await;

        let url = url
            .filter(|_| config.enable_url_state)
            .map(|ctx| UrlBindings::new(&ctx, &config));
        let query = match &url {
            Some(url) => {
                let mut query = url.read();
                if query.sort.is_none() {
                    query.sort = default_sort(&config);
                }
                query
            }
            None => TableQuery::initial(&config),
        };

        debug!(
            "table {} ready: {} column(s), page {} x {}",
            layout.table_id(),
            columns.len(),
            query.page_index + 1,
            query.page_size
        );

        let source: Arc<dyn ListSource<T>> = match source {
            Some(source) => source,
            None => Arc::new(MemorySource::<T>::new(Vec::new())),
        };
        DataTable {
            search_fields: columns.iter().map(|c| c.id.clone()).collect(),
            search_input: SearchInput::new(query.search.clone()),
            columns,
            config,
            layout,
            selection: SelectionTracker::new(id_field),
            visibility: ColumnVisibility::new(),
            url,
            query,
            source,
            rows: Vec::new(),
            total: 0,
            phase: TablePhase::Idle,
            last_error: None,
            nav: KeyboardNav::new(),
            exporting: Arc::new(AtomicBool::new(false)),
            entity_name,
        }
    }
}

/// Headless data table.
///
/// # Example
///
/// ```ignore
/// let mut table = DataTable::builder(columns)
///     .config(TableConfig::default().with_manual(false))
///     .rows(users)
///     .entity_name("users")
///     .build()
///     .await;
/// table.refresh().await?;
/// table.on_global_filter_change("ann").await?;
/// let view = table.view();
/// ```
pub struct DataTable<T> {
    columns: Vec<ColumnDef>,
    config: TableConfig,
    layout: ColumnLayoutManager,
    selection: SelectionTracker,
    visibility: ColumnVisibility,
    url: Option<UrlBindings>,
    query: TableQuery,
    source: Arc<dyn ListSource<T>>,
    search_fields: Vec<String>,
    /// Rows of the current page.
    rows: Vec<T>,
    total: usize,
    phase: TablePhase,
    last_error: Option<String>,
    nav: KeyboardNav,
    search_input: SearchInput,
    exporting: Arc<AtomicBool>,
    entity_name: String,
}

impl<T> std::fmt::Debug for DataTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTable")
            .field("table_id", &self.layout.table_id())
            .field("query", &self.query)
            .field("rows", &self.rows.len())
            .field("total", &self.total)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<T: TableRow> DataTable<T> {
    pub fn builder(columns: Vec<ColumnDef>) -> DataTableBuilder<T> {
        DataTableBuilder {
            columns,
            config: TableConfig::default(),
            storage: None,
            url: None,
            source: None,
            entity_name: "data".to_string(),
            id_field: "id".to_string(),
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn query(&self) -> &TableQuery {
        &self.query
    }

    /// Rows of the current page.
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Rows across all pages.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn phase(&self) -> TablePhase {
        self.phase
    }

    /// Message of the last failed fetch, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn layout(&self) -> &ColumnLayoutManager {
        &self.layout
    }

    pub fn visibility(&self) -> &ColumnVisibility {
        &self.visibility
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::SeqCst)
    }

    /// Visible columns in display order.
    pub fn visible_columns(&self) -> Vec<&ColumnDef> {
        ordered_columns(&self.columns, self.layout.column_order())
            .into_iter()
            .filter(|c| is_visible(&self.visibility, &c.id))
            .collect()
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(
            PaginationState::new(self.query.page_index, self.query.page_size),
            self.total,
            self.config.page_size_options.clone(),
        )
    }

    pub fn toolbar(&self) -> Toolbar {
        let enabled = self.config.enable_toolbar;
        Toolbar {
            search_placeholder: self.config.search_placeholder.clone(),
            show_search: enabled && self.config.enable_search,
            show_date_filter: enabled && self.config.enable_date_filter,
            show_view_options: enabled && self.config.enable_column_visibility,
            show_export: enabled && self.config.enable_export,
            search: self.search_input.draft().to_string(),
            date_range: self.query.date_range,
            selected_count: self.selection.selected_count(),
            is_exporting: self.is_exporting(),
        }
    }

    /// Entries of the view-options menu.
    pub fn view_options(&self) -> Vec<ViewOption> {
        menu_items(&self.columns, self.layout.column_order(), &self.visibility)
    }

    /// Builds the render-ready view.
    pub fn view(&self) -> TableView {
        let columns = self.visible_columns();
        let sizing = self.layout.column_sizing();
        let headers: Vec<HeaderCell> = columns
            .iter()
            .map(|c| HeaderCell {
                id: c.id.clone(),
                label: c.header.clone(),
                width: sizing.get(&c.id).copied().unwrap_or(c.bounds.size),
                sortable: c.sortable,
                resizable: c.resizable && self.config.enable_column_resizing,
                sort: self
                    .query
                    .sort
                    .as_ref()
                    .filter(|s| s.column == c.id)
                    .map(|s| s.order),
            })
            .collect();

        let selectable = self.config.enable_row_selection;
        let rows = match self.phase {
            TablePhase::Idle | TablePhase::Loading => {
                vec![ViewRow::Skeleton { cells: headers.len() }; self.query.page_size]
            }
            TablePhase::Empty => vec![ViewRow::NoResults {
                colspan: headers.len() + usize::from(selectable),
            }],
            TablePhase::Populated => self
                .rows
                .iter()
                .enumerate()
                .map(|(index, row)| {
                    let id = row.row_id(self.selection.id_field());
                    ViewRow::Data {
                        index,
                        selected: id.as_ref().is_some_and(|id| self.selection.is_selected(id)),
                        id,
                        focused_cell: self
                            .nav
                            .focus()
                            .filter(|(r, _)| *r == index)
                            .map(|(_, c)| c),
                        cells: columns.iter().map(|c| cell_text(&row.cell(&c.id))).collect(),
                    }
                })
                .collect(),
        };

        TableView {
            phase: self.phase,
            size: self.config.size,
            selectable,
            page_selection: self.selection.page_selection(&self.rows),
            headers,
            rows,
        }
    }

    /// Refetches the current page.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        self.phase = TablePhase::Loading;
        debug!("table {} loading with {:?}", self.layout.table_id(), self.query);

        let server = self.server_params();
        let fetched = if self.config.manual_pagination {
            self.source
                .fetch(&server)
                .await
                .map(|page| (page.items, Some(page.total)))
        } else {
            self.fetch_every_page(server).await.map(|rows| (rows, None))
        };

        let (rows, server_total) = match fetched {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("table {} failed to load rows: {}", self.layout.table_id(), e);
                self.rows.clear();
                self.total = 0;
                self.phase = TablePhase::Empty;
                self.last_error = Some(e.user_message());
                return Err(e);
            }
        };

        let rows = apply_query(
            &rows,
            &self.client_params(),
            &self.search_fields,
            self.selection.id_field(),
        );
        let (rows, total) = match server_total {
            Some(total) => (rows, total),
            None if !self.config.enable_pagination => {
                let total = rows.len();
                (rows, total)
            }
            None => {
                let total = rows.len();
                let start = self.query.page_index.saturating_mul(self.query.page_size);
                let page = rows.into_iter().skip(start).take(self.query.page_size).collect();
                (page, total)
            }
        };

        self.rows = rows;
        self.total = total;
        self.last_error = None;
        self.phase = if self.rows.is_empty() {
            TablePhase::Empty
        } else {
            TablePhase::Populated
        };
        self.nav.clamp(self.rows.len(), self.visible_columns().len());
        debug!(
            "table {} {:?}: {} row(s) of {}",
            self.layout.table_id(),
            self.phase,
            self.rows.len(),
            self.total
        );
        Ok(())
    }

    /// Sorting changed; `None` restores the default sort.
    pub async fn on_sorting_change(&mut self, sort: Option<SortSpec>) -> Result<(), ApiError> {
        let sort = sort.or_else(|| default_sort(&self.config));
        if sort == self.query.sort {
            return Ok(());
        }
        self.query.sort = sort;
        self.commit_query().await
    }

    /// Page or page size changed. A new page size returns to the first
    /// page; page indexes are clamped to the known page count.
    pub async fn on_pagination_change(&mut self, state: PaginationState) -> Result<(), ApiError> {
        let state = PaginationState::new(state.page_index, state.page_size);
        let page_index = if state.page_size != self.query.page_size {
            0
        } else if self.phase == TablePhase::Idle {
            state.page_index
        } else {
            self.pagination().clamp(state.page_index)
        };
        if page_index == self.query.page_index && state.page_size == self.query.page_size {
            return Ok(());
        }
        self.query.page_index = page_index;
        self.query.page_size = state.page_size;
        self.nav.reset();
        self.commit_query().await
    }

    /// Search text changed. Returns to the first page.
    pub async fn on_global_filter_change(&mut self, search: &str) -> Result<(), ApiError> {
        self.search_input.reset(search);
        if search == self.query.search {
            return Ok(());
        }
        self.query.search = search.to_string();
        self.query.page_index = 0;
        self.nav.reset();
        self.commit_query().await
    }

    /// Date range changed. Returns to the first page.
    pub async fn on_date_range_change(&mut self, range: DateRange) -> Result<(), ApiError> {
        if range == self.query.date_range {
            return Ok(());
        }
        self.query.date_range = range;
        self.query.page_index = 0;
        self.nav.reset();
        self.commit_query().await
    }

    /// Sets a feature filter; an empty value removes it. Returns to the
    /// first page.
    pub async fn on_filter_change(&mut self, key: &str, value: &str) -> Result<(), ApiError> {
        let current = self.query.filters.get(key).map(String::as_str).unwrap_or_default();
        if current == value {
            return Ok(());
        }
        if value.is_empty() {
            self.query.filters.shift_remove(key);
        } else {
            self.query.filters.insert(key.to_string(), value.to_string());
        }
        self.query.page_index = 0;
        self.nav.reset();
        self.commit_query().await
    }

    /// Clears search and dates.
    pub async fn reset_filters(&mut self) -> Result<(), ApiError> {
        self.search_input.reset("");
        if self.query.search.is_empty() && self.query.date_range.is_empty() {
            return Ok(());
        }
        self.query.search.clear();
        self.query.date_range = DateRange::default();
        self.query.page_index = 0;
        self.nav.reset();
        self.commit_query().await
    }

    /// Records a keystroke in the search box.
    pub fn type_search(&mut self, text: &str, now: Instant) {
        self.search_input.input(text, now);
    }

    /// Applies the typed search once the debounce period has passed.
    /// Returns `true` if a search was applied.
    pub async fn poll_search(&mut self, now: Instant) -> Result<bool, ApiError> {
        match self.search_input.poll(now) {
            Some(search) => self.on_global_filter_change(&search).await.map(|()| true),
            None => Ok(false),
        }
    }

    /// Column order changed, e.g. by dragging a header.
    pub async fn on_column_order_change(&mut self, order: Vec<String>) {
        self.layout.set_column_order(order).await;
    }

    /// Column widths changed.
    pub async fn on_column_sizing_change(&mut self, sizing: ColumnSizing) {
        if !self.config.enable_column_resizing {
            return;
        }
        self.layout.set_column_sizing(sizing).await;
    }

    /// Resizes one column. Returns the width applied.
    pub async fn resize_column(&mut self, column_id: &str, width: u32) -> Option<u32> {
        let resizable = self
            .columns
            .iter()
            .any(|c| c.id == column_id && c.resizable);
        if !resizable || !self.config.enable_column_resizing {
            return None;
        }
        Some(self.layout.resize_column(column_id, width).await)
    }

    /// Returns to the declared order and widths.
    pub async fn reset_layout(&mut self) {
        reset_column_order(&mut self.layout).await;
        self.layout.reset_column_sizing().await;
    }

    /// Column visibility changed. Columns that cannot be hidden stay visible.
    pub fn on_column_visibility_change(&mut self, visibility: ColumnVisibility) {
        self.visibility = visibility
            .into_iter()
            .filter(|(id, visible)| *visible || self.columns.iter().any(|c| &c.id == id && c.hideable))
            .collect();
        self.nav.clamp(self.rows.len(), self.visible_columns().len());
    }

    /// Flips one column's visibility from the view-options menu.
    pub fn toggle_column(&mut self, column_id: &str) {
        let mut visibility = self.visibility.clone();
        visibility.insert(column_id.to_string(), !is_visible(&self.visibility, column_id));
        self.on_column_visibility_change(visibility);
    }

    /// Moves a column from the view-options menu. Persists the table's order
    /// and the shared one.
    pub async fn move_column(&mut self, column_id: &str, offset: isize) -> bool {
        match view_options::move_column(&self.columns, self.layout.column_order(), column_id, offset) {
            Some(order) => {
                save_column_order(&mut self.layout, order).await;
                true
            }
            None => false,
        }
    }

    /// Page-relative selection changed.
    pub fn on_row_selection_change(&mut self, change: RowSelectionChange) {
        if !self.config.enable_row_selection {
            return;
        }
        self.selection.handle_row_selection_change(&self.rows, change);
    }

    /// Clears the selection of one row on the page.
    pub fn on_row_deselection(&mut self, page_index: usize) -> bool {
        self.selection.handle_row_deselection(&self.rows, page_index)
    }

    /// Header checkbox: selects the page unless it is fully selected.
    pub fn toggle_page_selection(&mut self) {
        if !self.config.enable_row_selection {
            return;
        }
        match self.selection.page_selection(&self.rows) {
            crate::selection::PageSelection::All => self.selection.deselect_page(&self.rows),
            _ => self.selection.select_page(&self.rows),
        }
    }

    /// Row click. Returns the clicked row's id.
    pub fn on_row_click(&mut self, page_index: usize) -> Option<RowId> {
        let id = self.rows.get(page_index)?.row_id(self.selection.id_field());
        if self.config.enable_click_row_select && self.config.enable_row_selection {
            self.selection.toggle(&self.rows, page_index);
        }
        id
    }

    /// Keyboard input inside the table body.
    pub fn handle_key(&mut self, key: NavKey) -> KeyOutcome {
        if !self.config.enable_keyboard_navigation {
            return KeyOutcome::Ignored;
        }
        let rows = if self.phase == TablePhase::Populated {
            self.rows.len()
        } else {
            0
        };
        let cols = self.visible_columns().len();
        let outcome = self
            .nav
            .handle(key, rows, cols, self.config.enable_row_selection);
        if let KeyOutcome::ToggleSelection(row) = outcome {
            self.selection.toggle(&self.rows, row);
        }
        outcome
    }

    /// An external navigation happened (back/forward, link).
    ///
    /// Refetches if any bound parameter changed. Returns `true` in that case.
    pub async fn on_location_change(&mut self, location: &Location) -> Result<bool, ApiError> {
        let Some(url) = self.url.as_mut() else {
            return Ok(false);
        };
        if !url.sync(location) {
            return Ok(false);
        }
        let mut query = url.read();
        if query.sort.is_none() {
            query.sort = default_sort(&self.config);
        }
        query.filters = std::mem::take(&mut self.query.filters);
        self.search_input.reset(query.search.clone());
        self.query = query;
        self.nav.reset();
        self.refresh().await.map(|()| true)
    }

    /// Exports rows of this table.
    ///
    /// Only visible, exportable columns are written, in display order. Rows
    /// beyond the current page come from `sources`.
    pub async fn export(
        &self,
        format: ExportFormat,
        target: ExportTarget,
        sources: &dyn ExportSources,
        notifier: &dyn Notifier,
    ) -> Result<ExportArtifact, ExportError> {
        let _guard = ExportGuard::acquire(&self.exporting)?;

        let columns: Vec<&ColumnDef> = self
            .visible_columns()
            .into_iter()
            .filter(|c| c.exportable)
            .collect();
        let headers: Vec<String> = columns.iter().map(|c| c.id.clone()).collect();
        let mapping: IndexMap<String, String> = columns
            .iter()
            .map(|c| (c.id.clone(), c.header.clone()))
            .collect();
        let widths: Vec<ColumnWidth> = columns
            .iter()
            .map(|c| ColumnWidth::chars(c.export_width.unwrap_or(DEFAULT_EXCEL_COLUMN_WIDTH)))
            .collect();
        let options = ExportOptions::new(self.entity_name.clone())
            .with_headers(headers)
            .with_column_mapping(mapping)
            .with_column_widths(widths)
            .with_sort(self.query.sort.clone())
            .with_allow_new_columns(self.config.allow_export_new_columns);

        let all_ids: Vec<String> = self.columns.iter().map(|c| c.id.clone()).collect();
        let current_page: Vec<Record> = self.rows.iter().map(|r| r.to_record(&all_ids)).collect();

        let id_field = self.selection.id_field();
        let selected_ids: Vec<RowId> = self.selection.selected_ids().cloned().collect();
        let selected_rows: Vec<Record> = selected_ids
            .iter()
            .map(|id| {
                self.rows
                    .iter()
                    .find(|row| row.row_id(id_field).as_ref() == Some(id))
                    .map_or_else(Record::empty, |row| row.to_record(&all_ids))
            })
            .collect();

        let job = ExportJob::new(format, options)
            .with_target(target)
            .with_query(self.export_params())
            .with_current_page(current_page)
            .with_selection(selected_ids, selected_rows);
        export_data(job, sources, notifier).await
    }

    async fn commit_query(&mut self) -> Result<(), ApiError> {
        if let Some(url) = self.url.as_mut() {
            url.write(&self.query);
        }
        self.refresh().await
    }

    fn server_params(&self) -> ListParams {
        let config = &self.config;
        let mut params = if config.manual_pagination {
            ListParams::new(self.query.page_index + 1, self.query.page_size)
        } else {
            ListParams::new(1, FETCH_ALL_PAGE_SIZE)
        };
        if let Some(sort) = self.query.sort.as_ref().filter(|_| config.manual_sorting) {
            params = params.with_sort(sort.column.clone(), sort.order);
        }
        if config.manual_searching {
            params = params.with_search(self.query.search.clone());
        }
        if config.manual_filtering {
            params = self.with_filters(params);
        }
        params
    }

    /// The whole active query, for sources that fetch beyond the loaded page.
    fn export_params(&self) -> ListParams {
        let mut params = ListParams::new(1, FETCH_ALL_PAGE_SIZE).with_search(self.query.search.clone());
        if let Some(sort) = &self.query.sort {
            params = params.with_sort(sort.column.clone(), sort.order);
        }
        self.with_filters(params)
    }

    /// The parts of the query computed locally.
    fn client_params(&self) -> ListParams {
        let config = &self.config;
        let mut params = ListParams::default();
        if let Some(sort) = self.query.sort.as_ref().filter(|_| !config.manual_sorting) {
            params = params.with_sort(sort.column.clone(), sort.order);
        }
        if !config.manual_searching {
            params = params.with_search(self.query.search.clone());
        }
        if !config.manual_filtering {
            params = self.with_filters(params);
        }
        params
    }

    fn with_filters(&self, mut params: ListParams) -> ListParams {
        params = params
            .with_filter(query::FROM_DATE, self.query.date_range.from_param())
            .with_filter(query::TO_DATE, self.query.date_range.to_param());
        for (key, value) in &self.query.filters {
            params = params.with_filter(key.clone(), value.clone());
        }
        params
    }

    async fn fetch_every_page(&self, params: ListParams) -> Result<Vec<T>, ApiError> {
        let mut rows = Vec::new();
        let mut page = 1;
        loop {
            let result = self.source.fetch(&params.for_page(page)).await?;
            let fetched = result.items.len();
            rows.extend(result.items);
            if fetched == 0 || rows.len() >= result.total {
                return Ok(rows);
            }
            page += 1;
        }
    }
}
