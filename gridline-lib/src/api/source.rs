//! Row sources backing a table

use std::cmp::Ordering;

use async_trait::async_trait;
use log::debug;

use super::ListParams;
use super::PaginatedResult;
use super::Resource;
use super::RestClient;
use crate::error::ApiError;
use crate::error::ExportError;
use crate::export::ExportSources;
use crate::export::compare_values;
use crate::export::cell_text;
use crate::model::Record;
use crate::model::RowId;
use crate::model::TableRow;

/// Supplies pages of rows for a table in manual mode.
#[async_trait]
pub trait ListSource<T>: Send + Sync {
    async fn fetch(&self, params: &ListParams) -> Result<PaginatedResult<T>, ApiError>;
}

/// A resource served by the REST API.
#[derive(Debug, Clone)]
pub struct RemoteRows {
    client: RestClient,
    resource: Resource,
}

impl RemoteRows {
    pub fn new(client: RestClient, resource: Resource) -> Self {
        Self { client, resource }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }
}

#[async_trait]
impl ListSource<Record> for RemoteRows {
    async fn fetch(&self, params: &ListParams) -> Result<PaginatedResult<Record>, ApiError> {
        self.client.list(self.resource, params).await
    }
}

#[async_trait]
impl ExportSources for RemoteRows {
    fn can_fetch_selected(&self) -> bool {
        true
    }

    fn can_fetch_all(&self) -> bool {
        true
    }

    async fn fetch_selected(&self, ids: &[RowId]) -> Result<Vec<Record>, ExportError> {
        self.client
            .fetch_by_ids(self.resource, ids)
            .await
            .map_err(|e| ExportError::Fetch(e.user_message()))
    }

    async fn fetch_all(&self, query: &ListParams) -> Result<Vec<Record>, ExportError> {
        self.client
            .fetch_all(self.resource, query)
            .await
            .map_err(|e| ExportError::Fetch(e.user_message()))
    }
}

/// Rows held in memory, paged the way the server pages them.
///
/// Search matches any cell case-insensitively; `filters` match cells
/// exactly, except `from_date`/`to_date` which bound the `created_at` cell.
#[derive(Debug, Clone)]
pub struct MemorySource<T> {
    rows: Vec<T>,
    id_field: String,
    search_fields: Vec<String>,
}

impl<T: TableRow> MemorySource<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows,
            id_field: "id".to_string(),
            search_fields: Vec::new(),
        }
    }

    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Cells searched by the global filter.
    pub fn with_search_fields(mut self, fields: Vec<String>) -> Self {
        self.search_fields = fields;
        self
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// All rows matching `params`, sorted, ignoring pagination.
    pub fn query(&self, params: &ListParams) -> Vec<T> {
        apply_query(&self.rows, params, &self.search_fields, &self.id_field)
    }
}

/// Applies search, filters and sort from `params` to `rows`, ignoring
/// pagination.
///
/// Search matches any of `search_fields` case-insensitively. The `ids`
/// filter is a comma-separated list matched against `id_field`.
pub fn apply_query<T: TableRow>(
    rows: &[T],
    params: &ListParams,
    search_fields: &[String],
    id_field: &str,
) -> Vec<T> {
    let needle = params.search.as_deref().map(str::to_lowercase);
    let mut rows: Vec<T> = rows
        .iter()
        .filter(|row| {
            needle
                .as_deref()
                .is_none_or(|n| matches_search(*row, n, search_fields))
        })
        .filter(|row| matches_filters(*row, params, id_field))
        .cloned()
        .collect();

    if let Some(sort_by) = &params.sort_by {
        let desc = params.sort_order.is_some_and(|o| o.is_desc());
        rows.sort_by(|a, b| {
            let ordering = compare_values(&a.cell(sort_by), &b.cell(sort_by));
            if desc { ordering.reverse() } else { ordering }
        });
    }
    rows
}

fn matches_search<T: TableRow>(row: &T, needle: &str, fields: &[String]) -> bool {
    fields
        .iter()
        .any(|field| cell_text(&row.cell(field)).to_lowercase().contains(needle))
}

fn matches_filters<T: TableRow>(row: &T, params: &ListParams, id_field: &str) -> bool {
    params.filters.iter().all(|(key, value)| match key.as_str() {
        "from_date" => date_cmp(row, value) != Ordering::Less,
        "to_date" => date_cmp(row, value) != Ordering::Greater,
        "ids" => row
            .row_id(id_field)
            .map(|id| id.to_string())
            .is_some_and(|id| value.split(',').any(|candidate| candidate == id)),
        _ => cell_text(&row.cell(key)) == *value,
    })
}

/// Compares the date part of `created_at` with a `YYYY-MM-DD` bound.
fn date_cmp<T: TableRow>(row: &T, bound: &str) -> Ordering {
    let created = cell_text(&row.cell("created_at"));
    let day = created.get(..10).unwrap_or(&created);
    day.cmp(bound)
}

#[async_trait]
impl<T: TableRow> ListSource<T> for MemorySource<T> {
    async fn fetch(&self, params: &ListParams) -> Result<PaginatedResult<T>, ApiError> {
        let rows = self.query(params);
        let total = rows.len();
        let start = (params.page.max(1) - 1).saturating_mul(params.limit);
        let items: Vec<T> = rows.into_iter().skip(start).take(params.limit).collect();
        debug!("memory page {} -> {} of {} rows", params.page, items.len(), total);
        Ok(PaginatedResult::new(items, total))
    }
}

#[async_trait]
impl ExportSources for MemorySource<Record> {
    fn can_fetch_selected(&self) -> bool {
        true
    }

    fn can_fetch_all(&self) -> bool {
        true
    }

    async fn fetch_selected(&self, ids: &[RowId]) -> Result<Vec<Record>, ExportError> {
        Ok(self
            .rows
            .iter()
            .filter(|row| row.row_id(&self.id_field).is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn fetch_all(&self, query: &ListParams) -> Result<Vec<Record>, ExportError> {
        Ok(self.query(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SortOrder;

    fn users() -> MemorySource<Record> {
        let rows = (1..=25)
            .map(|i| {
                Record::empty()
                    .set("id", i)
                    .set("name", format!("user {i:02}"))
                    .set("role", if i % 5 == 0 { "admin" } else { "member" })
                    .set("created_at", format!("2024-01-{i:02}T09:00:00Z"))
            })
            .collect();
        MemorySource::new(rows).with_search_fields(vec!["name".to_string()])
    }

    #[tokio::test]
    async fn test_pages_report_total() {
        let source = users();
        let last = source.fetch(&ListParams::new(3, 10)).await.unwrap();
        assert_eq!(last.items.len(), 5);
        assert_eq!(last.total, 25);
    }

    #[tokio::test]
    async fn test_search_filter_and_sort() {
        let source = users();
        let params = ListParams::new(1, 10)
            .with_search("USER 1")
            .with_filter("role", "admin")
            .with_sort("id", SortOrder::Desc);
        let page = source.fetch(&params).await.unwrap();
        let ids: Vec<RowId> = page.items.iter().filter_map(|r| r.row_id("id")).collect();
        assert_eq!(ids, vec![RowId::Num(15), RowId::Num(10)]);
    }

    #[tokio::test]
    async fn test_date_range() {
        let source = users();
        let params = ListParams::new(1, 50)
            .with_filter("from_date", "2024-01-10")
            .with_filter("to_date", "2024-01-12");
        assert_eq!(source.fetch(&params).await.unwrap().total, 3);
    }

    #[tokio::test]
    async fn test_export_sources() {
        let source = users();
        let rows = source
            .fetch_selected(&[RowId::Num(3), RowId::Num(30)])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(source.fetch_all(&ListParams::default()).await.unwrap().len(), 25);

        let admins = ListParams::default()
            .with_filter("role", "admin")
            .with_sort("id", SortOrder::Desc);
        let rows = source.fetch_all(&admins).await.unwrap();
        let ids: Vec<RowId> = rows.iter().filter_map(|r| r.row_id("id")).collect();
        assert_eq!(ids, vec![RowId::Num(25), RowId::Num(20), RowId::Num(15), RowId::Num(10), RowId::Num(5)]);
    }

    #[tokio::test]
    async fn test_ids_filter_uses_id_field() {
        let rows = vec![
            Record::empty().set("uuid", "a-1").set("name", "Ann"),
            Record::empty().set("uuid", "b-2").set("name", "Bob"),
            Record::empty().set("uuid", "c-3").set("name", "Cid"),
        ];
        let source = MemorySource::new(rows).with_id_field("uuid");
        let params = ListParams::new(1, 10).with_filter("ids", "a-1,c-3");
        let page = source.fetch(&params).await.unwrap();
        let names: Vec<String> = page
            .items
            .iter()
            .map(|r| r.get_str("name").unwrap().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["Ann", "Cid"]);
    }
}
