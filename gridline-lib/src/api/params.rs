//! List request parameters

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use crate::config::SortOrder;

/// Query sent to a list endpoint.
///
/// `page` is 1-based, as the endpoints expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub page: usize,
    pub limit: usize,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
    /// Feature-specific filters such as `from_date` or `status`.
    pub filters: IndexMap<String, String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort_by: None,
            sort_order: None,
            search: None,
            filters: IndexMap::new(),
        }
    }
}

impl ListParams {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            ..Self::default()
        }
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = Some(order);
        self
    }

    /// Sets the search text; blank text clears it.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = (!search.trim().is_empty()).then_some(search);
        self
    }

    /// Adds a filter; an empty value removes it.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if value.is_empty() {
            self.filters.shift_remove(&key);
        } else {
            self.filters.insert(key, value);
        }
        self
    }

    /// Same query on another page.
    pub fn for_page(&self, page: usize) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// Key/value pairs in request order.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sortBy".to_string(), sort_by.clone()));
        }
        if let Some(order) = self.sort_order {
            pairs.push(("sortOrder".to_string(), order.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        for (key, value) in &self.filters {
            pairs.push((key.clone(), value.clone()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs() {
        let params = ListParams::new(2, 20)
            .with_sort("name", SortOrder::Asc)
            .with_search("  ")
            .with_filter("status", "active")
            .with_filter("from_date", "2024-01-01")
            .with_filter("status", "");

        let pairs = params.to_query_pairs();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["page", "limit", "sortBy", "sortOrder", "from_date"]);
        assert_eq!(pairs[3].1, "asc");
    }

    #[test]
    fn test_page_is_at_least_one() {
        assert_eq!(ListParams::new(0, 0).page, 1);
        assert_eq!(ListParams::new(3, 10).for_page(0).page, 1);
    }
}
