//! Where gridline keeps its files.
//!
//! Everything lives under one root per kind of data:
//!
//! | file                | directory                       |
//! |---------------------|---------------------------------|
//! | `layouts.db`        | data (column order and widths)  |
//! | `table.json`        | config ([`TableConfigOverrides`]) |
//! | `gridline.log`      | state (current run)             |
//! | `gridline-*.log`    | state (earlier runs)            |
//!
//! `GRIDLINE_HOME` puts all three under a single directory instead of the
//! platform locations.
//!
//! [`TableConfigOverrides`]: gridline_lib::config::TableConfigOverrides

use std::io;
use std::path::Path;
use std::path::PathBuf;

use chrono::Local;
use directories::ProjectDirs;
use log::debug;

const HOME_VAR: &str = "GRIDLINE_HOME";
const CURRENT_LOG: &str = "gridline.log";
const ARCHIVED_PREFIX: &str = "gridline-";
const KEEP_LOGS: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    data: PathBuf,
    config: PathBuf,
    state: PathBuf,
}

impl AppPaths {
    /// `GRIDLINE_HOME` if set, else the platform directories.
    pub fn discover() -> Option<Self> {
        if let Some(home) = std::env::var_os(HOME_VAR).filter(|v| !v.is_empty()) {
            return Some(Self::under(Path::new(&home)));
        }
        let dirs = ProjectDirs::from("dev", "gridline", "gridline")?;
        // macOS and Windows have no state dir
        let state = dirs.state_dir().unwrap_or_else(|| dirs.cache_dir());
        Some(Self {
            data: dirs.data_dir().to_path_buf(),
            config: dirs.config_dir().to_path_buf(),
            state: state.to_path_buf(),
        })
    }

    /// Single-directory layout rooted at `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            data: root.join("data"),
            config: root.join("config"),
            state: root.join("logs"),
        }
    }

    pub fn layouts_db(&self) -> PathBuf {
        self.data.join("layouts.db")
    }

    pub fn table_config(&self) -> PathBuf {
        self.config.join("table.json")
    }

    pub fn log_file(&self) -> PathBuf {
        self.state.join(CURRENT_LOG)
    }

    /// Archives the previous run's log and prunes old archives.
    ///
    /// Archives are named `gridline-YYYYmmdd-HHMMSS.log`, so name order is
    /// age order.
    pub fn rotate_logs(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.state)?;
        let current = self.log_file();
        if current.exists() {
            let stamp = Local::now().format("%Y%m%d-%H%M%S");
            std::fs::rename(&current, self.state.join(format!("{ARCHIVED_PREFIX}{stamp}.log")))?;
        }
        prune_logs(&self.state, KEEP_LOGS)
    }
}

fn prune_logs(dir: &Path, keep: usize) -> io::Result<()> {
    let mut archived: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(ARCHIVED_PREFIX) && name.ends_with(".log"))
        })
        .collect();
    archived.sort();

    let excess = archived.len().saturating_sub(keep);
    for path in archived.into_iter().take(excess) {
        debug!("removing old log {}", path.display());
        std::fs::remove_file(path)?;
    }
    Ok(())
}
