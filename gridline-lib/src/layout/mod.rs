//! Column layout persistence.
//!
//! Column order and widths are stored per table under
//! `{table_id}-column-order` and `{table_id}-column-sizing`. Storage is best
//! effort: read failures leave the default layout, and the first failed
//! write switches the manager to in-memory only for the rest of the session.

mod sizing;

pub use sizing::*;

use std::collections::HashMap;

use log::debug;
use log::error;
use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::storage::Storage;

/// Key shared by every view-options menu, independent of table id.
pub const GLOBAL_COLUMN_ORDER_KEY: &str = "data-table-column-order";

/// Storage key for a table's column order.
pub fn column_order_key(table_id: &str) -> String {
    format!("{table_id}-column-order")
}

/// Storage key for a table's column widths.
pub fn column_sizing_key(table_id: &str) -> String {
    format!("{table_id}-column-sizing")
}

/// Generates a table id for callers that do not supply one.
pub fn generate_table_id() -> String {
    format!("table-{}", uuid::Uuid::new_v4())
}

/// Persisted order and widths of a table's columns.
///
/// An empty `column_order` means the columns' declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    pub column_order: Vec<String>,
    pub column_sizing: ColumnSizing,
}

/// Loads, updates and persists one table's column layout.
#[derive(Debug)]
pub struct ColumnLayoutManager {
    table_id: String,
    storage: Storage,
    layout: ColumnLayout,
    bounds: HashMap<String, SizeBounds>,
    /// `true` when the sizing came from storage rather than defaults.
    sizing_persisted: bool,
    /// Cleared after the first failed write.
    persistent: bool,
    reflow: watch::Sender<u64>,
}

impl ColumnLayoutManager {
    /// Loads the layout for `table_id`, generating an id when `None`.
    ///
    /// Never fails: a missing or unreadable entry yields the default layout.
    pub async fn load(table_id: Option<&str>, storage: Storage) -> Self {
        let table_id = match table_id {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => generate_table_id(),
        };

        let column_order: Vec<String> = read_or_default(&storage, &column_order_key(&table_id)).await;
        let column_sizing: Option<ColumnSizing> =
            read_or_default(&storage, &column_sizing_key(&table_id)).await;
        let sizing_persisted = column_sizing.as_ref().is_some_and(|s| !s.is_empty());

        debug!(
            "loaded layout for {}: {} ordered column(s), {} sized column(s)",
            table_id,
            column_order.len(),
            column_sizing.as_ref().map_or(0, |s| s.len())
        );

        let (reflow, _) = watch::channel(0);
        Self {
            table_id,
            storage,
            layout: ColumnLayout {
                column_order,
                column_sizing: column_sizing.unwrap_or_default(),
            },
            bounds: HashMap::new(),
            sizing_persisted,
            persistent: true,
            reflow,
        }
    }

    /// Table id used in storage keys.
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Storage shared with this manager.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Current layout.
    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Column ids in display order. Empty means declared order.
    pub fn column_order(&self) -> &[String] {
        &self.layout.column_order
    }

    /// Column widths.
    pub fn column_sizing(&self) -> &ColumnSizing {
        &self.layout.column_sizing
    }

    /// `false` once a write has failed and changes stay in memory.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Registers the table's columns.
    ///
    /// When no widths were persisted, widths start from the declared sizes.
    /// Persisted widths are clamped into the declared bounds.
    pub fn init_columns<'a>(&mut self, columns: impl IntoIterator<Item = (&'a str, SizeBounds)>) {
        self.bounds = columns
            .into_iter()
            .map(|(id, bounds)| (id.to_string(), bounds))
            .collect();

        if self.sizing_persisted {
            for (id, width) in self.layout.column_sizing.iter_mut() {
                if let Some(bounds) = self.bounds.get(id) {
                    *width = bounds.clamp(*width);
                }
            }
        } else {
            self.layout.column_sizing = default_sizing(self.bounds.iter().map(|(id, b)| (id.as_str(), *b)));
        }
    }

    /// Replaces the column order and persists it.
    pub async fn set_column_order(&mut self, order: Vec<String>) {
        if order == self.layout.column_order {
            return;
        }
        self.layout.column_order = order;
        let key = column_order_key(&self.table_id);
        let order = self.layout.column_order.clone();
        self.write(&key, &order).await;
    }

    /// Replaces all widths (clamped to each column's bounds) and persists them.
    pub async fn set_column_sizing(&mut self, mut sizing: ColumnSizing) {
        for (id, width) in sizing.iter_mut() {
            if let Some(bounds) = self.bounds.get(id) {
                *width = bounds.clamp(*width);
            }
        }
        if sizing == self.layout.column_sizing {
            return;
        }
        self.layout.column_sizing = sizing;
        self.sizing_persisted = true;
        let key = column_sizing_key(&self.table_id);
        let sizing = self.layout.column_sizing.clone();
        self.write(&key, &sizing).await;
    }

    /// Resizes a single column. Returns the width actually applied.
    pub async fn resize_column(&mut self, column_id: &str, width: u32) -> u32 {
        let width = self
            .bounds
            .get(column_id)
            .map_or(width, |bounds| bounds.clamp(width));
        let mut sizing = self.layout.column_sizing.clone();
        sizing.insert(column_id.to_string(), width);
        self.set_column_sizing(sizing).await;
        width
    }

    /// Returns to the declared order and forgets the stored order.
    pub async fn reset_column_order(&mut self) {
        self.layout.column_order.clear();
        self.remove(&column_order_key(&self.table_id)).await;
        self.bump_reflow();
    }

    /// Returns to declared widths and forgets the stored widths.
    pub async fn reset_column_sizing(&mut self) {
        self.layout.column_sizing = default_sizing(self.bounds.iter().map(|(id, b)| (id.as_str(), *b)));
        self.sizing_persisted = false;
        self.remove(&column_sizing_key(&self.table_id)).await;
        self.bump_reflow();
    }

    /// Receiver notified with a new generation whenever the layout is reset
    /// and dependent measurements should be recomputed.
    pub fn subscribe_reflow(&self) -> watch::Receiver<u64> {
        self.reflow.subscribe()
    }

    /// Current reflow generation.
    pub fn reflow_generation(&self) -> u64 {
        *self.reflow.borrow()
    }

    /// Applies an order without persisting it under this table's key.
    pub(crate) fn adopt_column_order(&mut self, order: Vec<String>) {
        self.layout.column_order = order;
    }

    fn bump_reflow(&self) {
        self.reflow.send_modify(|generation| *generation += 1);
    }

    async fn write<T: Serialize + Sync>(&mut self, key: &str, value: &T) {
        if !self.persistent {
            return;
        }
        if let Err(e) = self.storage.set(key, value).await {
            error!("failed to persist {}: {}; keeping layout in memory", key, e);
            self.persistent = false;
        }
    }

    async fn remove(&mut self, key: &str) {
        if !self.persistent {
            return;
        }
        if let Err(e) = self.storage.delete(key).await {
            error!("failed to remove {}: {}; keeping layout in memory", key, e);
            self.persistent = false;
        }
    }
}

async fn read_or_default<T: DeserializeOwned + Default>(storage: &Storage, key: &str) -> T {
    match storage.get(key).await {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            warn!("ignoring stored {}: {}", key, e);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use crate::storage::StorageBackend;

    fn columns() -> Vec<(&'static str, SizeBounds)> {
        vec![
            ("id", SizeBounds::sized(80)),
            ("name", SizeBounds::sized(200).with_min(100).with_max(400)),
        ]
    }

    #[tokio::test]
    async fn test_miss_yields_default_layout() {
        let mut manager = ColumnLayoutManager::load(Some("users"), Storage::in_memory()).await;
        manager.init_columns(columns());

        assert!(manager.column_order().is_empty());
        assert_eq!(manager.column_sizing().get("name"), Some(&200));
        assert_eq!(manager.table_id(), "users");
    }

    #[tokio::test]
    async fn test_corrupt_entry_yields_default_order() {
        let backend = MemoryBackend::new();
        backend
            .set_bytes("users-column-order", b"[\"id\",".to_vec())
            .await
            .unwrap();
        let manager = ColumnLayoutManager::load(Some("users"), Storage::new(backend)).await;
        assert!(manager.column_order().is_empty());
    }

    #[tokio::test]
    async fn test_layout_survives_reload() {
        let storage = Storage::in_memory();
        let mut manager = ColumnLayoutManager::load(Some("users"), storage.clone()).await;
        manager.init_columns(columns());
        manager
            .set_column_order(vec!["name".to_string(), "id".to_string()])
            .await;
        assert_eq!(manager.resize_column("name", 9000).await, 400);

        let mut reloaded = ColumnLayoutManager::load(Some("users"), storage).await;
        reloaded.init_columns(columns());
        assert_eq!(reloaded.column_order(), ["name", "id"]);
        assert_eq!(reloaded.column_sizing().get("name"), Some(&400));
        assert_eq!(reloaded.column_sizing().get("id"), Some(&80));
    }

    #[tokio::test]
    async fn test_reset_removes_entries_and_bumps_reflow() {
        let storage = Storage::in_memory();
        let mut manager = ColumnLayoutManager::load(Some("users"), storage.clone()).await;
        manager.init_columns(columns());
        let mut reflow = manager.subscribe_reflow();

        manager.set_column_order(vec!["name".to_string()]).await;
        manager.resize_column("id", 120).await;
        manager.reset_column_order().await;
        manager.reset_column_sizing().await;

        assert!(manager.column_order().is_empty());
        assert_eq!(manager.column_sizing().get("id"), Some(&80));
        assert_eq!(storage.get::<Vec<String>>("users-column-order").await.unwrap(), None);
        assert_eq!(storage.get::<ColumnSizing>("users-column-sizing").await.unwrap(), None);
        assert!(reflow.has_changed().unwrap());
        assert_eq!(*reflow.borrow_and_update(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_degrades_to_memory() {
        let storage = Storage::new(MemoryBackend::with_quota(0));
        let mut manager = ColumnLayoutManager::load(Some("users"), storage.clone()).await;

        manager.set_column_order(vec!["id".to_string()]).await;

        assert!(!manager.is_persistent());
        assert_eq!(manager.column_order(), ["id"]);
        manager.set_column_order(vec!["name".to_string()]).await;
        assert_eq!(manager.column_order(), ["name"]);
        assert!(storage.keys_with_prefix("users").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generated_table_id() {
        let a = ColumnLayoutManager::load(None, Storage::in_memory()).await;
        let b = ColumnLayoutManager::load(Some("  "), Storage::in_memory()).await;
        assert!(a.table_id().starts_with("table-"));
        assert_ne!(a.table_id(), b.table_id());
    }
}
