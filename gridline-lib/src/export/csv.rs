//! CSV serialization

use ::csv::QuoteStyle;
use ::csv::Terminator;
use ::csv::WriterBuilder;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ExportError;
use crate::model::Record;

/// Display label for a column: the mapped name, else the raw id.
pub fn header_label<'a>(column: &'a str, mapping: &'a IndexMap<String, String>) -> &'a str {
    mapping.get(column).map(String::as_str).unwrap_or(column)
}

/// Plain-text form of a cell. Null renders empty.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Renders rows as CSV, one line per row joined with `\n`.
///
/// Fields holding a comma, a double quote or a line break are quoted, with
/// inner quotes doubled.
///
/// ```
/// use gridline_lib::export::to_csv;
/// use gridline_lib::model::Record;
///
/// let rows = vec![Record::empty().set("name", "A,B").set("id", 1)];
/// let csv = to_csv(&["id".into(), "name".into()], &Default::default(), &rows).unwrap();
/// assert_eq!(csv, b"id,name\n1,\"A,B\"");
/// ```
pub fn to_csv(
    headers: &[String],
    mapping: &IndexMap<String, String>,
    rows: &[Record],
) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(headers.iter().map(|h| header_label(h, mapping)))?;
    for row in rows {
        writer.write_record(
            headers
                .iter()
                .map(|h| row.get(h).map(cell_text).unwrap_or_default()),
        )?;
    }

    let mut bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    // joined, not terminated
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn headers(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn render(ids: &[&str], mapping: &IndexMap<String, String>, rows: &[Record]) -> String {
        String::from_utf8(to_csv(&headers(ids), mapping, rows).unwrap()).unwrap()
    }

    #[test]
    fn test_comma_field_is_quoted() {
        let rows = vec![Record::empty().set("name", "A,B").set("id", 1)];
        let csv = render(&["id", "name"], &IndexMap::new(), &rows);
        assert_eq!(csv.lines().nth(1), Some("1,\"A,B\""));
    }

    #[test]
    fn test_quotes_are_doubled() {
        let rows = vec![
            Record::empty().set("quote", r#"say "hi""#),
            Record::empty().set("quote", "plain"),
        ];
        let csv = render(&["quote"], &IndexMap::new(), &rows);
        assert_eq!(csv, "quote\n\"say \"\"hi\"\"\"\nplain");
    }

    #[test]
    fn test_line_breaks_are_quoted() {
        let rows = vec![Record::empty().set("id", 1).set("note", "two\nlines")];
        let csv = render(&["id", "note"], &IndexMap::new(), &rows);
        assert_eq!(csv, "id,note\n1,\"two\nlines\"");
    }

    #[test]
    fn test_header_mapping_and_nulls() {
        let mapping = IndexMap::from([("created_at".to_string(), "Created, at".to_string())]);
        let rows = vec![
            Record::empty().set("created_at", Value::Null).set("active", true),
            Record::empty().set("tags", json!(["a"])),
        ];
        let csv = render(&["created_at", "active", "tags"], &mapping, &rows);
        assert_eq!(csv, "\"Created, at\",active,tags\n,true,\n,,\"[\"\"a\"\"]\"");
    }
}
