//! Row model
//!
//! Tables are generic over [`TableRow`]. Rows expose their cells as JSON
//! values and a stable [`RowId`] read from a configurable id field, so that
//! selection survives paging and re-sorting.

mod record;

pub use record::*;

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Stable external identifier of a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Num(i64),
    Str(String),
}

impl RowId {
    /// Extracts an id from a JSON value.
    ///
    /// Returns `None` for null, booleans, arrays and objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Num(i)),
                None => Some(Self::Str(n.to_string())),
            },
            _ => None,
        }
    }

    /// Converts back into a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Num(n) => Value::from(*n),
            Self::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{}", n),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        Self::Num(value)
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Trait for rows that can be displayed, selected and exported by a table.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone)]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl TableRow for User {
///     fn cell(&self, column_id: &str) -> Value {
///         match column_id {
///             "id" => Value::from(self.id),
///             "name" => Value::from(self.name.as_str()),
///             _ => Value::Null,
///         }
///     }
/// }
/// ```
pub trait TableRow: Clone + Send + Sync + 'static {
    /// Value of the given column, `Value::Null` when absent.
    fn cell(&self, column_id: &str) -> Value;

    /// Identity of this row read from `id_field`.
    fn row_id(&self, id_field: &str) -> Option<RowId> {
        RowId::from_value(&self.cell(id_field))
    }

    /// `true` for rows that stand in for data not loaded yet.
    fn is_placeholder(&self) -> bool {
        false
    }

    /// Projects the given columns into a [`Record`].
    fn to_record(&self, columns: &[String]) -> Record {
        let mut record = Record::empty();
        for column in columns {
            record.insert(column.clone(), self.cell(column));
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_row_id_from_value() {
        assert_eq!(RowId::from_value(&json!(42)), Some(RowId::Num(42)));
        assert_eq!(RowId::from_value(&json!("abc")), Some(RowId::from("abc")));
        assert_eq!(RowId::from_value(&json!(1.5)), Some(RowId::from("1.5")));
        assert_eq!(RowId::from_value(&json!(null)), None);
        assert_eq!(RowId::from_value(&json!({"id": 1})), None);
    }

    #[test]
    fn test_row_id_serde_untagged() {
        let ids: Vec<RowId> = serde_json::from_str(r#"[1, "u-2"]"#).unwrap();
        assert_eq!(ids, vec![RowId::Num(1), RowId::from("u-2")]);
        assert_eq!(serde_json::to_string(&ids).unwrap(), r#"[1,"u-2"]"#);
    }
}
