//! Excel workbook generation

use indexmap::IndexMap;
use rust_xlsxwriter::Color;
use rust_xlsxwriter::Format;
use rust_xlsxwriter::Workbook;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::csv::cell_text;
use super::csv::header_label;
use crate::error::ExportError;
use crate::model::Record;

/// Column width used when none is given.
pub const DEFAULT_EXCEL_COLUMN_WIDTH: f64 = 15.0;

const SHEET_NAME: &str = "Data";
const HEADER_FILL: u32 = 0xD9D9D9;

/// Width of one spreadsheet column, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnWidth {
    pub wch: f64,
}

impl ColumnWidth {
    pub fn chars(wch: f64) -> Self {
        Self { wch }
    }
}

/// Header labels and widths of the generated sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub columns: Vec<String>,
    pub labels: Vec<String>,
    pub widths: Vec<f64>,
}

impl SheetLayout {
    /// Lays out `headers`, taking widths positionally from `widths`.
    pub fn new(
        headers: &[String],
        mapping: &IndexMap<String, String>,
        widths: &[ColumnWidth],
    ) -> Self {
        Self {
            columns: headers.to_vec(),
            labels: headers
                .iter()
                .map(|h| header_label(h, mapping).to_string())
                .collect(),
            widths: (0..headers.len())
                .map(|i| widths.get(i).map_or(DEFAULT_EXCEL_COLUMN_WIDTH, |w| w.wch))
                .collect(),
        }
    }
}

/// Builds a single-sheet workbook and returns the `.xlsx` bytes.
///
/// The header row is bold on a light gray fill; every value is written as a
/// string and nulls leave the cell empty.
pub fn to_xlsx(layout: &SheetLayout, rows: &[Record]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(HEADER_FILL));

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, (label, width)) in layout.labels.iter().zip(&layout.widths).enumerate() {
        let col = column_index(col)?;
        sheet.set_column_width(col, *width)?;
        sheet.write_string_with_format(0, col, label, &header_format)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let excel_row = u32::try_from(index + 1).map_err(|_| too_large("rows"))?;
        for (col, column) in layout.columns.iter().enumerate() {
            match row.get(column) {
                None | Some(Value::Null) => {}
                Some(value) => {
                    sheet.write_string(excel_row, column_index(col)?, cell_text(value))?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn column_index(col: usize) -> Result<u16, ExportError> {
    u16::try_from(col).map_err(|_| too_large("columns"))
}

fn too_large(what: &str) -> ExportError {
    ExportError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("too many {what} for a worksheet"),
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_zip::base::read::mem::ZipFileReader;

    use super::*;
    use crate::export::ExportFormat;
    use crate::export::ExportJob;
    use crate::export::ExportOptions;
    use crate::export::LocalRows;
    use crate::export::NullNotifier;
    use crate::export::export_data;

    /// Package part name -> XML text.
    async fn unzip(bytes: Vec<u8>) -> HashMap<String, String> {
        let reader = ZipFileReader::new(bytes).await.unwrap();
        let mut parts = HashMap::new();
        for index in 0..reader.file().entries().len() {
            let name = reader.file().entries()[index]
                .filename()
                .as_str()
                .unwrap()
                .to_string();
            let mut entry = reader.reader_with_entry(index).await.unwrap();
            let mut xml = String::new();
            entry.read_to_string_checked(&mut xml).await.unwrap();
            parts.insert(name, xml);
        }
        parts
    }

    #[test]
    fn test_widths_default_to_fifteen() {
        let headers = vec!["name".to_string(), "email".to_string()];
        let layout = SheetLayout::new(&headers, &IndexMap::new(), &[ColumnWidth::chars(20.0)]);
        assert_eq!(layout.widths, vec![20.0, 15.0]);
        assert_eq!(layout.labels, headers);
    }

    #[test]
    fn test_labels_use_mapping() {
        let mapping = IndexMap::from([("email".to_string(), "E-mail".to_string())]);
        let layout = SheetLayout::new(&["email".to_string()], &mapping, &[]);
        assert_eq!(layout.labels, vec!["E-mail".to_string()]);
    }

    #[test]
    fn test_workbook_is_zip() {
        let layout = SheetLayout::new(&["id".to_string()], &IndexMap::new(), &[]);
        let rows = vec![
            Record::empty().set("id", 1),
            Record::empty().set("id", Value::Null),
        ];
        let bytes = to_xlsx(&layout, &rows).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn test_exported_workbook_applies_layout() {
        let options = ExportOptions::new("users")
            .with_headers(vec!["name".to_string(), "email".to_string()])
            .with_column_mapping(IndexMap::from([("name".to_string(), "Full name".to_string())]))
            .with_column_widths(vec![ColumnWidth::chars(20.0)]);
        let job = ExportJob::new(ExportFormat::Excel, options).with_current_page(vec![
            Record::empty().set("name", "Ann").set("email", "ann@example.com"),
            Record::empty().set("name", "Bob").set("email", Value::Null),
        ]);

        let artifact = export_data(job, &LocalRows, &NullNotifier).await.unwrap();
        let parts = unzip(artifact.bytes).await;

        let sheet = &parts["xl/worksheets/sheet1.xml"];
        assert!(sheet.contains(r#"<col min="1" max="1" width="20.7"#), "{sheet}");
        assert!(sheet.contains(r#"<col min="2" max="2" width="15.7"#), "{sheet}");
        assert!(sheet.contains(r#"<c r="A1" s="1""#), "{sheet}");
        assert!(sheet.contains(r#"r="B2""#));
        assert!(!sheet.contains(r#"r="B3""#));

        let styles = &parts["xl/styles.xml"];
        assert!(styles.contains("<b/>"), "{styles}");
        assert!(styles.contains(r#"rgb="FFD9D9D9""#), "{styles}");

        let strings = &parts["xl/sharedStrings.xml"];
        assert!(strings.contains("<t>Full name</t>"), "{strings}");
        assert!(parts["xl/workbook.xml"].contains(r#"name="Data""#));
    }
}
