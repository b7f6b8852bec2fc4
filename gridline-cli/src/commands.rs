//! Subcommand implementations.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use clap::ValueEnum;
use gridline_lib::api::ListParams;
use gridline_lib::api::MemorySource;
use gridline_lib::api::RemoteRows;
use gridline_lib::api::Resource;
use gridline_lib::api::RestClient;
use gridline_lib::config::SortOrder;
use gridline_lib::config::TableConfig;
use gridline_lib::config::TableConfigOverrides;
use gridline_lib::export::Downloader;
use gridline_lib::export::ExportFormat;
use gridline_lib::export::ExportSources;
use gridline_lib::export::ExportTarget;
use gridline_lib::export::FileDownloader;
use gridline_lib::export::LogNotifier;
use gridline_lib::export::SortSpec;
use gridline_lib::layout::ColumnLayoutManager;
use gridline_lib::model::Record;
use gridline_lib::query::MemoryHistory;
use gridline_lib::query::UrlStateContext;
use gridline_lib::selection::RowSelection;
use gridline_lib::selection::RowSelectionChange;
use gridline_lib::storage::SqliteBackend;
use gridline_lib::storage::Storage;
use gridline_lib::table::ColumnDef;
use gridline_lib::table::DataTable;
use gridline_lib::table::reset_column_order;
use log::debug;
use log::info;
use log::warn;

use crate::error::CliError;
use crate::paths::AppPaths;
use crate::render;

/// Where rows come from.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Resource the rows belong to.
    #[arg(short, long, default_value = "users")]
    pub resource: Resource,

    /// JSON file holding an array of row objects.
    #[arg(long, conflicts_with = "remote")]
    pub file: Option<PathBuf>,

    /// Base URL of the REST API.
    #[arg(long)]
    pub remote: Option<String>,

    /// Bearer token for the REST API.
    #[arg(long, requires = "remote")]
    pub token: Option<String>,

    /// Query string as it would appear in the page URL, e.g. `page=2&search=ann`.
    #[arg(short, long, default_value = "")]
    pub query: String,

    /// Columns to show, comma separated. Defaults to the first row's fields.
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Sort and filter locally instead of on the server.
    #[arg(long)]
    pub client_side: bool,

    /// Layout id. Defaults to the resource name.
    #[arg(long)]
    pub table_id: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Csv,
    Excel,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => Self::Csv,
            FormatArg::Excel => Self::Excel,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TargetArg {
    CurrentPage,
    Selected,
    AllPages,
}

impl From<TargetArg> for ExportTarget {
    fn from(value: TargetArg) -> Self {
        match value {
            TargetArg::CurrentPage => Self::CurrentPage,
            TargetArg::Selected => Self::Selected,
            TargetArg::AllPages => Self::AllPages,
        }
    }
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(short, long, value_enum, default_value = "csv")]
    pub format: FormatArg,

    #[arg(short, long, value_enum, default_value = "current-page")]
    pub target: TargetArg,

    /// Rows of the current page to select first, by position.
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<usize>,

    /// Directory the file is written to.
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,
}

/// Rows loaded for a command, plus what can serve exports.
struct Loaded {
    table: DataTable<Record>,
    exports: Arc<dyn ExportSources>,
    ctx: UrlStateContext,
}

/// Where a table's rows come from.
enum Origin {
    File(MemorySource<Record>),
    Remote(RemoteRows),
}

/// Opens the layout database, falling back to memory.
pub async fn open_storage(paths: Option<&AppPaths>) -> Storage {
    let Some(path) = paths.map(AppPaths::layouts_db) else {
        warn!("no data directory; column layout will not persist");
        return Storage::in_memory();
    };
    if let Some(dir) = path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("failed to create {}: {}", dir.display(), e);
        }
    }
    match SqliteBackend::open(&path).await {
        Ok(backend) => Storage::new(backend),
        Err(e) => {
            warn!("failed to open {}: {}; using memory", path.display(), e);
            Storage::in_memory()
        }
    }
}

/// Table defaults from `table.json`; a missing file means no overrides.
async fn read_table_config(paths: Option<&AppPaths>) -> Result<TableConfig, CliError> {
    let Some(path) = paths.map(AppPaths::table_config) else {
        return Ok(TableConfig::default());
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let overrides: TableConfigOverrides = serde_json::from_slice(&bytes)
                .map_err(|e| CliError::Config(path.display().to_string(), e))?;
            debug!("loaded table overrides from {}", path.display());
            Ok(TableConfig::resolve(overrides))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TableConfig::default()),
        Err(e) => Err(e.into()),
    }
}

async fn read_rows(path: &Path) -> Result<Vec<Record>, CliError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn rest_client(args: &SourceArgs, remote: &str) -> Result<RestClient, CliError> {
    let mut client = RestClient::builder().base_url(remote);
    if let Some(token) = &args.token {
        client = client.bearer_token(token.clone());
    }
    Ok(client.build()?)
}

fn column_defs(requested: &[String], sample: Option<&Record>) -> Vec<ColumnDef> {
    let ids: Vec<String> = if requested.is_empty() {
        sample.map(|r| r.keys().cloned().collect()).unwrap_or_default()
    } else {
        requested.to_vec()
    };
    ids.into_iter()
        .map(|id| {
            let header = header_for(&id);
            ColumnDef::new(id, header)
        })
        .collect()
}

/// `created_at` -> `Created at`.
fn header_for(id: &str) -> String {
    let words = id.replace(['_', '-'], " ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

async fn load(paths: Option<&AppPaths>, args: &SourceArgs) -> Result<Loaded, CliError> {
    let storage = open_storage(paths).await;
    let defaults = read_table_config(paths).await?;
    let (columns, origin) = match (&args.file, &args.remote) {
        (Some(file), _) => {
            let rows = read_rows(file).await?;
            info!("loaded {} row(s) from {}", rows.len(), file.display());
            let columns = column_defs(&args.columns, rows.first());
            let source = MemorySource::new(rows)
                .with_search_fields(columns.iter().map(|c| c.id.clone()).collect());
            (columns, Origin::File(source))
        }
        (None, Some(remote)) => {
            let client = rest_client(args, remote)?;
            let sample = client
                .list::<Record>(args.resource, &ListParams::new(1, 1))
                .await?;
            let columns = column_defs(&args.columns, sample.items.first());
            (columns, Origin::Remote(RemoteRows::new(client, args.resource)))
        }
        (None, None) => {
            return Err(CliError::Usage(
                "either --file or --remote is required".to_string(),
            ));
        }
    };

    let history = Arc::new(MemoryHistory::from_href(&format!(
        "/{}?{}",
        args.resource.path(),
        args.query
    )));
    let ctx = UrlStateContext::new(history);
    let table_id = args
        .table_id
        .clone()
        .unwrap_or_else(|| args.resource.entity_name().to_string());
    let config = defaults
        .with_manual(!args.client_side)
        .with_table_id(table_id);

    let builder = DataTable::builder(columns)
        .config(config)
        .storage(storage)
        .url_context(&ctx)
        .entity_name(args.resource.entity_name());
    let builder = match &origin {
        Origin::File(source) => builder.source(source.clone()),
        Origin::Remote(rows) => builder.source(rows.clone()),
    };
    let mut table = builder.build().await;
    table.refresh().await?;

    let exports: Arc<dyn ExportSources> = match origin {
        Origin::File(source) => Arc::new(source),
        Origin::Remote(rows) => Arc::new(rows),
    };
    Ok(Loaded { table, exports, ctx })
}

/// Prints one page of a table.
pub async fn show(paths: Option<&AppPaths>, args: SourceArgs, sort: Option<String>) -> Result<(), CliError> {
    let Loaded { mut table, ctx, .. } = load(paths, &args).await?;

    if let Some(sort) = sort {
        table.on_sorting_change(Some(parse_sort(&sort)?)).await?;
    }

    let toolbar = render::toolbar(&table.toolbar());
    if !toolbar.is_empty() {
        println!("{toolbar}");
    }
    println!("{}", render::table(&table.view()));
    println!("{}", render::pagination(&table.pagination()));
    println!("{}", ctx.location());
    Ok(())
}

/// Writes an export file.
pub async fn export(paths: Option<&AppPaths>, args: ExportArgs) -> Result<(), CliError> {
    let Loaded {
        mut table, exports, ..
    } = load(paths, &args.source).await?;

    if !args.select.is_empty() {
        let selection: RowSelection = args.select.iter().map(|index| (*index, true)).collect();
        table.on_row_selection_change(RowSelectionChange::Replace(selection));
    }

    let artifact = table
        .export(args.format.into(), args.target.into(), exports.as_ref(), &LogNotifier)
        .await?;
    let path = FileDownloader::new(&args.out).download(&artifact).await?;
    println!("{}", path.display());
    Ok(())
}

/// Forgets the stored layout of a table.
pub async fn reset_layout(paths: Option<&AppPaths>, table_id: &str) -> Result<(), CliError> {
    let storage = open_storage(paths).await;
    let mut layout = ColumnLayoutManager::load(Some(table_id), storage).await;
    reset_column_order(&mut layout).await;
    layout.reset_column_sizing().await;
    println!("reset layout of {}", layout.table_id());
    Ok(())
}

/// Parses `column` or `column:asc|desc`.
fn parse_sort(raw: &str) -> Result<SortSpec, CliError> {
    let (column, order) = match raw.split_once(':') {
        Some((column, order)) => {
            let order = SortOrder::parse(order)
                .ok_or_else(|| CliError::Usage(format!("invalid sort order '{order}'")))?;
            (column, order)
        }
        None => (raw, SortOrder::Asc),
    };
    if column.is_empty() {
        return Err(CliError::Usage("empty sort column".to_string()));
    }
    Ok(SortSpec::new(column, order))
}
