mod commands;
mod error;
mod paths;
mod render;

use std::fs::File;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use log::error;
use log::warn;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::WriteLogger;

use crate::commands::ExportArgs;
use crate::commands::SourceArgs;
use crate::error::CliError;
use crate::paths::AppPaths;

#[derive(Parser)]
#[command(name = "gridline")]
#[command(version, about = "Browse and export admin data tables")]
struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one page of a table
    Show {
        #[command(flatten)]
        source: SourceArgs,

        /// Sort by `column` or `column:asc|desc`
        #[arg(long)]
        sort: Option<String>,
    },
    /// Write a CSV or Excel file
    Export(ExportArgs),
    /// Forget a table's stored column order and widths
    ResetLayout {
        /// Layout id, usually the resource name
        table_id: String,
    },
}

fn init_logging(paths: Option<&AppPaths>, verbose: bool) {
    let Some(paths) = paths else { return };
    // the logger does not exist yet; report after it does
    let rotated = paths.rotate_logs();
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let path = paths.log_file();
    match File::create(&path) {
        Ok(file) => {
            if let Err(e) = WriteLogger::init(level, Config::default(), file) {
                eprintln!("Failed to initialize logger: {}", e);
            }
        }
        Err(e) => eprintln!("Failed to create {}: {}", path.display(), e),
    }
    if let Err(e) = rotated {
        warn!("log rotation failed: {}", e);
    }
}

async fn run(cli: Cli, paths: Option<AppPaths>) -> Result<(), CliError> {
    let paths = paths.as_ref();
    match cli.command {
        Command::Show { source, sort } => commands::show(paths, source, sort).await,
        Command::Export(args) => commands::export(paths, args).await,
        Command::ResetLayout { table_id } => commands::reset_layout(paths, &table_id).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let paths = AppPaths::discover();
    init_logging(paths.as_ref(), cli.verbose);

    match run(cli, paths).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
