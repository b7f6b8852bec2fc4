//! Paginated list responses

use serde::Deserialize;
use serde::Serialize;

/// One page of a list endpoint, with the total across all pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: usize) -> Self {
        Self { items, total }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maps every item.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

impl<T> Default for PaginatedResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Inner object of the nested list shape.
#[derive(Debug, Deserialize)]
pub struct NestedPage<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total: Option<usize>,
}

/// The shapes list endpoints answer with.
///
/// Some endpoints return `{data: [...], total}`, others nest it once more as
/// `{data: {data: [...], total}}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Flat {
        data: Vec<T>,
        #[serde(default)]
        total: Option<usize>,
    },
    Nested {
        data: NestedPage<T>,
    },
}

impl<T> From<ListEnvelope<T>> for PaginatedResult<T> {
    fn from(envelope: ListEnvelope<T>) -> Self {
        let (items, total) = match envelope {
            ListEnvelope::Flat { data, total } => (data, total),
            ListEnvelope::Nested {
                data: NestedPage { data, total },
            } => (data, total),
        };
        // A missing total means the page is everything there is.
        let total = total.unwrap_or(items.len());
        Self { items, total }
    }
}

/// Parses a list response body in either shape.
pub fn parse_list<T: serde::de::DeserializeOwned>(
    body: &str,
) -> Result<PaginatedResult<T>, serde_json::Error> {
    serde_json::from_str::<ListEnvelope<T>>(body).map(PaginatedResult::from)
}
