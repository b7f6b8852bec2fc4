//! Table export.
//!
//! [`export_data`] resolves which rows to export (current page, selection or
//! every page), serializes them to CSV or XLSX and reports progress through a
//! single keyed [`Notifier`] notification.

mod csv;
mod download;
mod excel;
mod filename;
mod notify;
mod sort;

pub use self::csv::*;
pub use download::*;
pub use excel::*;
pub use filename::*;
pub use notify::*;
pub use sort::*;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use log::debug;

use crate::api::ListParams;
use crate::error::ExportError;
use crate::model::Record;
use crate::model::RowId;

/// Output file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    /// Parses `csv`, `excel` or `xlsx`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "excel" | "xlsx" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Which rows an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportTarget {
    /// Selected rows if any, else the current page.
    #[default]
    CurrentPage,
    Selected,
    /// Every row matching the current filters.
    AllPages,
}

/// Per-row hook applied before serialization.
pub type RowTransform = Arc<dyn Fn(Record) -> Record + Send + Sync>;

/// Column and naming options for an export.
#[derive(Clone, Default)]
pub struct ExportOptions {
    /// Column ids to export, in order. Empty means the first row's keys.
    pub headers: Vec<String>,
    /// Column id -> header label.
    pub column_mapping: IndexMap<String, String>,
    /// Spreadsheet widths by position.
    pub column_widths: Vec<ColumnWidth>,
    /// Filename prefix, e.g. `users`.
    pub entity_name: String,
    /// Sort applied to rows fetched outside the table.
    pub sort: Option<SortSpec>,
    pub transform: Option<RowTransform>,
    /// Append columns introduced by `transform` to the headers.
    pub allow_new_columns: bool,
}

impl std::fmt::Debug for ExportOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportOptions")
            .field("headers", &self.headers)
            .field("column_mapping", &self.column_mapping)
            .field("column_widths", &self.column_widths)
            .field("entity_name", &self.entity_name)
            .field("sort", &self.sort)
            .field("transform", &self.transform.is_some())
            .field("allow_new_columns", &self.allow_new_columns)
            .finish()
    }
}

impl ExportOptions {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ..Self::default()
        }
    }

    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_column_mapping(mut self, mapping: IndexMap<String, String>) -> Self {
        self.column_mapping = mapping;
        self
    }

    pub fn with_column_widths(mut self, widths: Vec<ColumnWidth>) -> Self {
        self.column_widths = widths;
        self
    }

    pub fn with_sort(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_transform(mut self, transform: impl Fn(Record) -> Record + Send + Sync + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn with_allow_new_columns(mut self, allow: bool) -> Self {
        self.allow_new_columns = allow;
        self
    }
}

/// One export request. Consumed by [`export_data`].
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub format: ExportFormat,
    pub target: ExportTarget,
    pub options: ExportOptions,
    /// Search, filters and sort of the table, repeated when fetching every
    /// matching row.
    pub query: ListParams,
    /// Rows of the page currently shown.
    pub current_page: Vec<Record>,
    /// Ids selected across all pages.
    pub selected_ids: Vec<RowId>,
    /// Selected rows as known locally. Rows not loaded yet are empty
    /// placeholders.
    pub selected_rows: Vec<Record>,
}

impl ExportJob {
    pub fn new(format: ExportFormat, options: ExportOptions) -> Self {
        Self {
            format,
            target: ExportTarget::CurrentPage,
            options,
            query: ListParams::default(),
            current_page: Vec::new(),
            selected_ids: Vec::new(),
            selected_rows: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: ExportTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_query(mut self, query: ListParams) -> Self {
        self.query = query;
        self
    }

    pub fn with_current_page(mut self, rows: Vec<Record>) -> Self {
        self.current_page = rows;
        self
    }

    pub fn with_selection(mut self, ids: Vec<RowId>, rows: Vec<Record>) -> Self {
        self.selected_ids = ids;
        self.selected_rows = rows;
        self
    }

    fn notification_key(&self) -> String {
        format!("export-{}", self.options.entity_name)
    }
}

/// A finished export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Server-side row sources for exports beyond the loaded page.
#[async_trait]
pub trait ExportSources: Send + Sync {
    fn can_fetch_selected(&self) -> bool {
        false
    }

    fn can_fetch_all(&self) -> bool {
        false
    }

    /// Loads the rows for `ids`, in any order.
    async fn fetch_selected(&self, _ids: &[RowId]) -> Result<Vec<Record>, ExportError> {
        Ok(Vec::new())
    }

    /// Loads every row matching `query`, ignoring its page and limit.
    async fn fetch_all(&self, _query: &ListParams) -> Result<Vec<Record>, ExportError> {
        Ok(Vec::new())
    }
}

/// No server-side sources: only locally loaded rows are exported.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalRows;

impl ExportSources for LocalRows {}

/// Marks an export as running; clears the flag when dropped.
#[derive(Debug)]
pub struct ExportGuard {
    flag: Arc<AtomicBool>,
}

impl ExportGuard {
    /// Sets `flag`, failing if an export is already running.
    pub fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, ExportError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ExportError::InProgress)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Runs an export job.
///
/// Errors are reported through `notifier` before being returned.
pub async fn export_data(
    job: ExportJob,
    sources: &dyn ExportSources,
    notifier: &dyn Notifier,
) -> Result<ExportArtifact, ExportError> {
    let key = job.notification_key();
    notifier.notify(&key, ExportPhase::Preparing, "Preparing export...");

    match run(job, sources, notifier, &key).await {
        Ok(artifact) => {
            notifier.notify(
                &key,
                ExportPhase::Success,
                &format!("Exported {}", artifact.filename),
            );
            Ok(artifact)
        }
        Err(e) => {
            notifier.notify(&key, ExportPhase::Error, &e.to_string());
            Err(e)
        }
    }
}

async fn run(
    job: ExportJob,
    sources: &dyn ExportSources,
    notifier: &dyn Notifier,
    key: &str,
) -> Result<ExportArtifact, ExportError> {
    let all_pages = job.target == ExportTarget::AllPages && sources.can_fetch_all();
    let rows = resolve_rows(&job, sources, notifier, key).await?;
    if rows.is_empty() {
        return Err(ExportError::NoData);
    }

    notifier.notify(
        key,
        ExportPhase::Processing,
        &format!("Processing {} rows...", rows.len()),
    );

    let ExportJob {
        format, options, ..
    } = job;
    let (headers, rows) = prepare(rows, &options);
    debug!(
        "exporting {} rows x {} columns as {}",
        rows.len(),
        headers.len(),
        format.extension()
    );

    let bytes = match format {
        ExportFormat::Csv => to_csv(&headers, &options.column_mapping, &rows)?,
        ExportFormat::Excel => {
            let layout = SheetLayout::new(&headers, &options.column_mapping, &options.column_widths);
            to_xlsx(&layout, &rows)?
        }
    };

    Ok(ExportArtifact {
        filename: export_filename(&options.entity_name, all_pages, format, Utc::now()),
        mime_type: format.mime_type(),
        bytes,
    })
}

async fn resolve_rows(
    job: &ExportJob,
    sources: &dyn ExportSources,
    notifier: &dyn Notifier,
    key: &str,
) -> Result<Vec<Record>, ExportError> {
    let has_selection = !job.selected_ids.is_empty() || !job.selected_rows.is_empty();

    if job.target != ExportTarget::AllPages && has_selection && sources.can_fetch_selected() {
        if job.selected_rows.iter().any(Record::is_empty) {
            notifier.notify(key, ExportPhase::Fetching, "Fetching selected items...");
        }
        let mut rows = sources.fetch_selected(&job.selected_ids).await?;
        if let Some(sort) = &job.options.sort {
            sort_records(&mut rows, sort);
        }
        return Ok(rows);
    }

    if sources.can_fetch_all() && (!has_selection || job.target == ExportTarget::AllPages) {
        return sources.fetch_all(&job.query).await;
    }

    if has_selection {
        return Ok(job
            .selected_rows
            .iter()
            .filter(|row| !row.is_empty())
            .cloned()
            .collect());
    }
    if job.target == ExportTarget::Selected {
        return Ok(Vec::new());
    }
    Ok(job.current_page.clone())
}

/// Applies the transform and works out the header list.
fn prepare(rows: Vec<Record>, options: &ExportOptions) -> (Vec<String>, Vec<Record>) {
    let rows: Vec<Record> = match &options.transform {
        Some(transform) => rows.into_iter().map(transform.as_ref()).collect(),
        None => rows,
    };

    let mut headers = if options.headers.is_empty() {
        rows.first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    } else {
        options.headers.clone()
    };

    if options.allow_new_columns && !options.headers.is_empty() {
        for row in &rows {
            for key in row.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }
    }

    (headers, rows)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::config::SortOrder;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(String, ExportPhase)>>,
    }

    impl Recorder {
        fn phases(&self) -> Vec<ExportPhase> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|(_, phase)| phase.clone())
                .collect()
        }

        fn keys(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|(key, _)| key.clone())
                .collect()
        }
    }

    impl Notifier for Recorder {
        fn notify(&self, key: &str, phase: ExportPhase, _message: &str) {
            self.events.lock().unwrap().push((key.to_string(), phase));
        }
    }

    struct Server {
        selected: Vec<Record>,
        all: Vec<Record>,
    }

    #[async_trait]
    impl ExportSources for Server {
        fn can_fetch_selected(&self) -> bool {
            true
        }

        fn can_fetch_all(&self) -> bool {
            true
        }

        async fn fetch_selected(&self, _ids: &[RowId]) -> Result<Vec<Record>, ExportError> {
            Ok(self.selected.clone())
        }

        /// Honors the search part of `query` only.
        async fn fetch_all(&self, query: &ListParams) -> Result<Vec<Record>, ExportError> {
            let needle = query.search.clone().unwrap_or_default();
            Ok(self
                .all
                .iter()
                .filter(|row| {
                    row.get_str("name")
                        .ok()
                        .flatten()
                        .is_some_and(|name| name.contains(&needle))
                })
                .cloned()
                .collect())
        }
    }

    fn user(id: i64, name: &str) -> Record {
        Record::empty().set("id", id).set("name", name)
    }

    fn csv_text(artifact: &ExportArtifact) -> String {
        String::from_utf8(artifact.bytes.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_current_page_csv() {
        let notifier = Recorder::default();
        let job = ExportJob::new(
            ExportFormat::Csv,
            ExportOptions::new("users").with_headers(vec!["id".into(), "name".into()]),
        )
        .with_current_page(vec![user(1, "A,B")]);

        let artifact = export_data(job, &LocalRows, &notifier).await.unwrap();

        assert_eq!(csv_text(&artifact), "id,name\n1,\"A,B\"");
        assert_eq!(artifact.mime_type, "text/csv");
        assert!(artifact.filename.starts_with("users-export-"));
        assert!(artifact.filename.ends_with(".csv"));
        assert_eq!(
            notifier.phases(),
            vec![ExportPhase::Preparing, ExportPhase::Processing, ExportPhase::Success]
        );
        assert!(notifier.keys().iter().all(|k| k == "export-users"));
    }

    #[tokio::test]
    async fn test_empty_fetch_selected_is_no_data() {
        let notifier = Recorder::default();
        let server = Server {
            selected: Vec::new(),
            all: vec![user(1, "a")],
        };
        let job = ExportJob::new(ExportFormat::Csv, ExportOptions::new("users"))
            .with_selection(vec![RowId::Num(7)], vec![Record::empty()]);

        let err = export_data(job, &server, &notifier).await.unwrap_err();

        assert!(matches!(err, ExportError::NoData));
        assert_eq!(
            notifier.phases(),
            vec![ExportPhase::Preparing, ExportPhase::Fetching, ExportPhase::Error]
        );
    }

    #[tokio::test]
    async fn test_fetched_selection_is_sorted() {
        let notifier = Recorder::default();
        let server = Server {
            selected: vec![user(2, "bob"), user(3, "Ann"), Record::empty().set("id", 4)],
            all: Vec::new(),
        };
        let job = ExportJob::new(
            ExportFormat::Csv,
            ExportOptions::new("users")
                .with_headers(vec!["id".into(), "name".into()])
                .with_sort(Some(SortSpec::new("name", SortOrder::Asc))),
        )
        .with_selection(
            vec![RowId::Num(2), RowId::Num(3), RowId::Num(4)],
            vec![user(2, "bob"), user(3, "Ann"), user(4, "x")],
        );

        let artifact = export_data(job, &server, &notifier).await.unwrap();

        assert_eq!(csv_text(&artifact), "id,name\n3,Ann\n2,bob\n4,");
        assert!(!notifier.phases().contains(&ExportPhase::Fetching));
    }

    #[tokio::test]
    async fn test_all_pages_uses_fetch_all() {
        let server = Server {
            selected: Vec::new(),
            all: vec![user(1, "a"), user(2, "b")],
        };
        let job = ExportJob::new(ExportFormat::Excel, ExportOptions::new("projects"))
            .with_target(ExportTarget::AllPages)
            .with_selection(vec![RowId::Num(1)], vec![user(1, "a")]);

        let artifact = export_data(job, &server, &NullNotifier).await.unwrap();

        assert!(artifact.filename.starts_with("projects-all-pages-export-"));
        assert!(artifact.filename.ends_with(".xlsx"));
        assert_eq!(&artifact.bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn test_fetch_all_repeats_table_query() {
        let server = Server {
            selected: Vec::new(),
            all: vec![user(1, "ann"), user(2, "bob"), user(3, "anna")],
        };
        let job = ExportJob::new(ExportFormat::Csv, ExportOptions::new("users"))
            .with_target(ExportTarget::AllPages)
            .with_query(ListParams::default().with_search("ann"))
            .with_current_page(vec![user(1, "ann")]);

        let artifact = export_data(job, &server, &NullNotifier).await.unwrap();

        assert_eq!(csv_text(&artifact), "id,name\n1,ann\n3,anna");
    }

    #[tokio::test]
    async fn test_nothing_anywhere_is_no_data() {
        let job = ExportJob::new(ExportFormat::Csv, ExportOptions::new("users"));
        let err = export_data(job, &LocalRows, &NullNotifier).await.unwrap_err();
        assert!(matches!(err, ExportError::NoData));
    }

    #[tokio::test]
    async fn test_transform_and_new_columns() {
        let options = ExportOptions::new("users")
            .with_headers(vec!["name".into()])
            .with_transform(|row| {
                let upper = row.get_str("name").ok().flatten().unwrap_or_default().to_uppercase();
                row.set("name", upper.clone()).set("shout", json!(format!("{upper}!")))
            });

        let job = ExportJob::new(ExportFormat::Csv, options.clone())
            .with_current_page(vec![user(1, "ada")]);
        let artifact = export_data(job, &LocalRows, &NullNotifier).await.unwrap();
        assert_eq!(csv_text(&artifact), "name\nADA");

        let job = ExportJob::new(ExportFormat::Csv, options.with_allow_new_columns(true))
            .with_current_page(vec![user(1, "ada")]);
        let artifact = export_data(job, &LocalRows, &NullNotifier).await.unwrap();
        assert_eq!(csv_text(&artifact), "name,id,shout\nADA,1,ADA!");
    }

    #[test]
    fn test_guard_clears_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        {
            let _guard = ExportGuard::acquire(&flag).unwrap();
            assert!(matches!(ExportGuard::acquire(&flag), Err(ExportError::InProgress)));
        }
        assert!(!flag.load(Ordering::SeqCst));
        assert!(ExportGuard::acquire(&flag).is_ok());
    }
}
