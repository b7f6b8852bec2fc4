//! Dynamic JSON record

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use super::TableRow;
use crate::error::FieldError;

/// A dynamic row as returned by the REST API.
///
/// Field order is preserved, so exports and transforms see columns in the
/// order the server sent them.
///
/// # Example
///
/// ```
/// use gridline_lib::model::Record;
///
/// let record = Record::empty()
///     .set("id", 7)
///     .set("name", "Contoso");
///
/// assert_eq!(record.get_str("name").unwrap(), Some("Contoso"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Creates a record with no fields.
    pub fn empty() -> Self {
        Self { fields: Map::new() }
    }

    /// Wraps an existing JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builder-style field setter.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Inserts or replaces a field.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns `true` if the record contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Consumes the record and returns the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    /// Gets a string field. Null yields `Ok(None)`.
    pub fn get_str(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(FieldError::type_mismatch(field, "string", type_name(other))),
        }
    }

    /// Gets an integer field. Null yields `Ok(None)`.
    pub fn get_i64(&self, field: &str) -> Result<Option<i64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| FieldError::type_mismatch(field, "integer", "float")),
            Some(other) => Err(FieldError::type_mismatch(field, "integer", type_name(other))),
        }
    }

    /// Gets a boolean field. Null yields `Ok(None)`.
    pub fn get_bool(&self, field: &str) -> Result<Option<bool>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(FieldError::type_mismatch(field, "boolean", type_name(other))),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}

impl TableRow for Record {
    fn cell(&self, column_id: &str) -> Value {
        self.fields.get(column_id).cloned().unwrap_or(Value::Null)
    }

    fn is_placeholder(&self) -> bool {
        self.fields.is_empty()
    }
}
