//! View-options menu: column visibility and order
//!
//! Besides the per-table key managed by [`ColumnLayoutManager`], the menu
//! mirrors every order it writes to the shared
//! [`GLOBAL_COLUMN_ORDER_KEY`]. The per-table order always wins; the shared
//! one is only read when a table has no order of its own.

use std::collections::BTreeMap;

use log::debug;
use log::warn;

use super::ColumnDef;
use super::ordered_columns;
use crate::layout::ColumnLayoutManager;
use crate::layout::GLOBAL_COLUMN_ORDER_KEY;
use crate::storage::Storage;

/// Column id -> visible. Missing ids are visible.
pub type ColumnVisibility = BTreeMap<String, bool>;

pub fn is_visible(visibility: &ColumnVisibility, column_id: &str) -> bool {
    visibility.get(column_id).copied().unwrap_or(true)
}

/// An entry of the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOption {
    pub id: String,
    pub label: String,
    pub visible: bool,
    /// Whether the checkbox is enabled.
    pub hideable: bool,
}

/// Menu entries in display order.
pub fn menu_items(columns: &[ColumnDef], order: &[String], visibility: &ColumnVisibility) -> Vec<ViewOption> {
    ordered_columns(columns, order)
        .into_iter()
        .map(|column| ViewOption {
            id: column.id.clone(),
            label: column.header.clone(),
            visible: is_visible(visibility, &column.id),
            hideable: column.hideable,
        })
        .collect()
}

/// Returns the full order with `column_id` moved by `offset` places, or
/// `None` when the column is unknown or already at that edge.
pub fn move_column(columns: &[ColumnDef], order: &[String], column_id: &str, offset: isize) -> Option<Vec<String>> {
    let mut ids: Vec<String> = ordered_columns(columns, order)
        .into_iter()
        .map(|c| c.id.clone())
        .collect();
    let from = ids.iter().position(|id| id == column_id)?;
    let to = from.checked_add_signed(offset)?;
    if to >= ids.len() || to == from {
        return None;
    }
    let id = ids.remove(from);
    ids.insert(to, id);
    Some(ids)
}

/// Persists `order` for the table and mirrors it to the shared key.
pub async fn save_column_order(layout: &mut ColumnLayoutManager, order: Vec<String>) {
    if let Err(e) = layout.storage().set(GLOBAL_COLUMN_ORDER_KEY, &order).await {
        warn!("failed to mirror column order to {}: {}", GLOBAL_COLUMN_ORDER_KEY, e);
    }
    layout.set_column_order(order).await;
}

/// Reads the shared order, empty when absent or unreadable.
pub async fn load_global_column_order(storage: &Storage) -> Vec<String> {
    match storage.get::<Vec<String>>(GLOBAL_COLUMN_ORDER_KEY).await {
        Ok(order) => order.unwrap_or_default(),
        Err(e) => {
            warn!("ignoring stored {}: {}", GLOBAL_COLUMN_ORDER_KEY, e);
            Vec::new()
        }
    }
}

/// Falls back to the shared order when the table has none stored.
///
/// Returns `true` if the shared order was adopted.
pub async fn restore_column_order(layout: &mut ColumnLayoutManager) -> bool {
    if !layout.column_order().is_empty() {
        return false;
    }
    let order = load_global_column_order(layout.storage()).await;
    if order.is_empty() {
        return false;
    }
    debug!("{} adopts the shared column order", layout.table_id());
    layout.adopt_column_order(order);
    true
}

/// Forgets both the table's order and the shared one.
pub async fn reset_column_order(layout: &mut ColumnLayoutManager) {
    if let Err(e) = layout.storage().delete(GLOBAL_COLUMN_ORDER_KEY).await {
        warn!("failed to remove {}: {}", GLOBAL_COLUMN_ORDER_KEY, e);
    }
    layout.reset_column_order().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::column_order_key;

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", "ID").hideable(false),
            ColumnDef::new("name", "Name"),
            ColumnDef::new("email", "E-mail"),
        ]
    }

    #[test]
    fn test_menu_items() {
        let visibility = ColumnVisibility::from([("email".to_string(), false)]);
        let items = menu_items(&columns(), &["email".to_string()], &visibility);
        assert_eq!(items[0].id, "email");
        assert!(!items[0].visible);
        assert!(!items[1].hideable);
        assert!(items[2].visible);
    }

    #[test]
    fn test_move_column() {
        let columns = columns();
        assert_eq!(
            move_column(&columns, &[], "email", -1),
            Some(vec!["id".to_string(), "email".to_string(), "name".to_string()])
        );
        assert_eq!(move_column(&columns, &[], "id", -1), None);
        assert_eq!(move_column(&columns, &[], "email", 1), None);
        assert_eq!(move_column(&columns, &[], "missing", 1), None);
    }

    #[tokio::test]
    async fn test_save_mirrors_to_shared_key() {
        let storage = Storage::in_memory();
        let mut layout = ColumnLayoutManager::load(Some("users"), storage.clone()).await;
        let order = vec!["name".to_string(), "id".to_string()];
        save_column_order(&mut layout, order.clone()).await;

        let stored: Option<Vec<String>> = storage.get(&column_order_key("users")).await.unwrap();
        assert_eq!(stored, Some(order.clone()));
        assert_eq!(load_global_column_order(&storage).await, order);
    }

    #[tokio::test]
    async fn test_per_table_order_wins_over_shared() {
        let storage = Storage::in_memory();
        storage
            .set(GLOBAL_COLUMN_ORDER_KEY, &vec!["email".to_string()])
            .await
            .unwrap();
        storage
            .set(&column_order_key("users"), &vec!["name".to_string()])
            .await
            .unwrap();

        let mut users = ColumnLayoutManager::load(Some("users"), storage.clone()).await;
        assert!(!restore_column_order(&mut users).await);
        assert_eq!(users.column_order(), ["name".to_string()]);

        let mut fresh = ColumnLayoutManager::load(Some("projects"), storage.clone()).await;
        assert!(restore_column_order(&mut fresh).await);
        assert_eq!(fresh.column_order(), ["email".to_string()]);
        // adopting does not write the table's own key
        let own: Option<Vec<String>> = storage.get(&column_order_key("projects")).await.unwrap();
        assert_eq!(own, None);
    }

    #[tokio::test]
    async fn test_reset_clears_both_keys() {
        let storage = Storage::in_memory();
        let mut layout = ColumnLayoutManager::load(Some("users"), storage.clone()).await;
        save_column_order(&mut layout, vec!["name".to_string()]).await;
        reset_column_order(&mut layout).await;
        assert!(layout.column_order().is_empty());
        assert!(load_global_column_order(&storage).await.is_empty());
    }
}
