//! Ordering of rows fetched outside the table.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::config::SortOrder;
use crate::model::Record;

/// Primary sort column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            column: column.into(),
            order,
        }
    }
}

/// Sorts rows by a single column. Stable.
///
/// Nulls go last ascending and first descending.
pub fn sort_records(rows: &mut [Record], spec: &SortSpec) {
    rows.sort_by(|a, b| {
        let ordering = compare_values(
            a.get(&spec.column).unwrap_or(&Value::Null),
            b.get(&spec.column).unwrap_or(&Value::Null),
        );
        if spec.order.is_desc() {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// Ascending comparison with null greater than everything.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::String(a), Value::String(b)) => collate(a, b),
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (a, b) => collate(&a.to_string(), &b.to_string()),
    }
}

/// Dictionary-style string comparison: case-insensitive first, then
/// lowercase before uppercase.
pub fn collate(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    primary.then_with(|| a.chars().map(swap_case).cmp(b.chars().map(swap_case)))
}

fn swap_case(c: char) -> char {
    if c.is_lowercase() {
        c.to_ascii_uppercase()
    } else if c.is_uppercase() {
        c.to_ascii_lowercase()
    } else {
        c
    }
}
