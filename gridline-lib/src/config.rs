//! Table configuration
//!
//! A [`TableConfig`] is the resolved set of feature flags for one table. It is
//! built by merging [`TableConfig::default`] with a [`TableConfigOverrides`]
//! supplied by the feature page, and is treated as immutable afterwards.

use serde::Deserialize;
use serde::Serialize;

/// Visual density of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSize {
    Sm,
    #[default]
    Default,
    Lg,
}

/// Sort direction as it appears in URLs and list requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Returns the URL/query representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Parses `asc`/`desc`, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Returns `true` for descending order.
    pub fn is_desc(&self) -> bool {
        matches!(self, Self::Desc)
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved configuration for a data table.
///
/// # Example
///
/// ```
/// use gridline_lib::config::{TableConfig, TableConfigOverrides};
///
/// let config = TableConfig::resolve(TableConfigOverrides {
///     enable_export: Some(false),
///     manual_pagination: Some(false),
///     ..Default::default()
/// });
/// assert!(!config.enable_export);
/// assert!(config.enable_search);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Checkbox column and selection tracking.
    ///
    /// Default: true
    pub enable_row_selection: bool,
    /// Clicking a row toggles its selection.
    ///
    /// Default: false
    pub enable_click_row_select: bool,
    /// Arrow-key cell traversal inside the scroll container.
    ///
    /// Default: false
    pub enable_keyboard_navigation: bool,
    /// Default: true
    pub enable_pagination: bool,
    /// Default: true
    pub enable_search: bool,
    /// Date range filter in the toolbar.
    ///
    /// Default: true
    pub enable_date_filter: bool,
    /// Column visibility menu.
    ///
    /// Default: true
    pub enable_column_visibility: bool,
    /// Default: true
    pub enable_export: bool,
    /// Bind pagination/sort/search to URL query parameters.
    ///
    /// Default: true
    pub enable_url_state: bool,
    /// Default: true
    pub enable_column_resizing: bool,
    /// Default: true
    pub enable_toolbar: bool,
    /// Default: [`TableSize::Default`]
    pub size: TableSize,
    /// Storage id for persisted layout. Generated when absent.
    pub column_resizing_table_id: Option<String>,
    /// Default: "Search..."
    pub search_placeholder: String,
    /// Default: "created_at"
    pub default_sort_by: String,
    /// Default: [`SortOrder::Desc`]
    pub default_sort_order: SortOrder,
    /// Keep columns introduced by an export transform.
    ///
    /// Default: false
    pub allow_export_new_columns: bool,
    /// Server computes pagination.
    ///
    /// Default: true
    pub manual_pagination: bool,
    /// Server computes sorting.
    ///
    /// Default: true
    pub manual_sorting: bool,
    /// Server computes column filtering.
    ///
    /// Default: true
    pub manual_filtering: bool,
    /// Server computes global search.
    ///
    /// Default: true
    pub manual_searching: bool,
    /// Choices offered by the rows-per-page selector.
    ///
    /// Default: [10, 20, 30, 40, 50]
    pub page_size_options: Vec<usize>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            enable_row_selection: true,
            enable_click_row_select: false,
            enable_keyboard_navigation: false,
            enable_pagination: true,
            enable_search: true,
            enable_date_filter: true,
            enable_column_visibility: true,
            enable_export: true,
            enable_url_state: true,
            enable_column_resizing: true,
            enable_toolbar: true,
            size: TableSize::Default,
            column_resizing_table_id: None,
            search_placeholder: "Search...".to_string(),
            default_sort_by: "created_at".to_string(),
            default_sort_order: SortOrder::Desc,
            allow_export_new_columns: false,
            manual_pagination: true,
            manual_sorting: true,
            manual_filtering: true,
            manual_searching: true,
            page_size_options: vec![10, 20, 30, 40, 50],
        }
    }
}

/// Caller overrides; every `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfigOverrides {
    pub enable_row_selection: Option<bool>,
    pub enable_click_row_select: Option<bool>,
    pub enable_keyboard_navigation: Option<bool>,
    pub enable_pagination: Option<bool>,
    pub enable_search: Option<bool>,
    pub enable_date_filter: Option<bool>,
    pub enable_column_visibility: Option<bool>,
    pub enable_export: Option<bool>,
    pub enable_url_state: Option<bool>,
    pub enable_column_resizing: Option<bool>,
    pub enable_toolbar: Option<bool>,
    pub size: Option<TableSize>,
    pub column_resizing_table_id: Option<String>,
    pub search_placeholder: Option<String>,
    pub default_sort_by: Option<String>,
    pub default_sort_order: Option<SortOrder>,
    pub allow_export_new_columns: Option<bool>,
    pub manual_pagination: Option<bool>,
    pub manual_sorting: Option<bool>,
    pub manual_filtering: Option<bool>,
    pub manual_searching: Option<bool>,
    pub page_size_options: Option<Vec<usize>>,
}

impl TableConfig {
    /// Merges overrides onto the defaults.
    pub fn resolve(overrides: TableConfigOverrides) -> Self {
        Self::default().merge(overrides)
    }

    /// Merges overrides onto `self`. Pure and total: every field either keeps
    /// its current value or takes the override.
    pub fn merge(self, o: TableConfigOverrides) -> Self {
        let page_size_options = match o.page_size_options {
            Some(options) if !options.is_empty() => options,
            _ => self.page_size_options,
        };
        Self {
            enable_row_selection: o.enable_row_selection.unwrap_or(self.enable_row_selection),
            enable_click_row_select: o
                .enable_click_row_select
                .unwrap_or(self.enable_click_row_select),
            enable_keyboard_navigation: o
                .enable_keyboard_navigation
                .unwrap_or(self.enable_keyboard_navigation),
            enable_pagination: o.enable_pagination.unwrap_or(self.enable_pagination),
            enable_search: o.enable_search.unwrap_or(self.enable_search),
            enable_date_filter: o.enable_date_filter.unwrap_or(self.enable_date_filter),
            enable_column_visibility: o
                .enable_column_visibility
                .unwrap_or(self.enable_column_visibility),
            enable_export: o.enable_export.unwrap_or(self.enable_export),
            enable_url_state: o.enable_url_state.unwrap_or(self.enable_url_state),
            enable_column_resizing: o
                .enable_column_resizing
                .unwrap_or(self.enable_column_resizing),
            enable_toolbar: o.enable_toolbar.unwrap_or(self.enable_toolbar),
            size: o.size.unwrap_or(self.size),
            column_resizing_table_id: o
                .column_resizing_table_id
                .or(self.column_resizing_table_id),
            search_placeholder: o.search_placeholder.unwrap_or(self.search_placeholder),
            default_sort_by: o.default_sort_by.unwrap_or(self.default_sort_by),
            default_sort_order: o.default_sort_order.unwrap_or(self.default_sort_order),
            allow_export_new_columns: o
                .allow_export_new_columns
                .unwrap_or(self.allow_export_new_columns),
            manual_pagination: o.manual_pagination.unwrap_or(self.manual_pagination),
            manual_sorting: o.manual_sorting.unwrap_or(self.manual_sorting),
            manual_filtering: o.manual_filtering.unwrap_or(self.manual_filtering),
            manual_searching: o.manual_searching.unwrap_or(self.manual_searching),
            page_size_options,
        }
    }

    /// First page size option, used when the URL carries none.
    pub fn default_page_size(&self) -> usize {
        self.page_size_options.first().copied().unwrap_or(10)
    }

    /// Sets whether every table operation is computed by the server.
    pub fn with_manual(mut self, manual: bool) -> Self {
        self.manual_pagination = manual;
        self.manual_sorting = manual;
        self.manual_filtering = manual;
        self.manual_searching = manual;
        self
    }

    /// Sets the persisted layout id.
    pub fn with_table_id(mut self, id: impl Into<String>) -> Self {
        self.column_resizing_table_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_overrides_yield_defaults() {
        assert_eq!(
            TableConfig::resolve(TableConfigOverrides::default()),
            TableConfig::default()
        );
    }

    #[test]
    fn test_overrides_apply_field_by_field() {
        let config = TableConfig::resolve(TableConfigOverrides {
            enable_search: Some(false),
            size: Some(TableSize::Sm),
            default_sort_order: Some(SortOrder::Asc),
            ..Default::default()
        });
        assert!(!config.enable_search);
        assert_eq!(config.size, TableSize::Sm);
        assert_eq!(config.default_sort_order, SortOrder::Asc);
        assert!(config.enable_export);
        assert!(config.manual_pagination);
    }

    #[test]
    fn test_empty_page_size_options_keep_default() {
        let config = TableConfig::resolve(TableConfigOverrides {
            page_size_options: Some(vec![]),
            ..Default::default()
        });
        assert_eq!(config.page_size_options, vec![10, 20, 30, 40, 50]);
        assert_eq!(config.default_page_size(), 10);
    }

    #[test]
    fn test_overrides_deserialize_partially() {
        let overrides: TableConfigOverrides =
            serde_json::from_str(r#"{"enable_export": false, "size": "lg"}"#).unwrap();
        let config = TableConfig::resolve(overrides);
        assert!(!config.enable_export);
        assert_eq!(config.size, TableSize::Lg);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse("ASC"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::parse("desc"), Some(SortOrder::Desc));
        assert_eq!(SortOrder::parse("sideways"), None);
    }
}
