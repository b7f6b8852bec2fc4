//! Export file naming

use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;

use super::ExportFormat;

/// `{entity}-export-{timestamp}.{ext}`, or `{entity}-all-pages-export-...`
/// when every page was exported.
///
/// The timestamp is ISO 8601 with `:` and `.` replaced by `-`.
pub fn export_filename(
    entity: &str,
    all_pages: bool,
    format: ExportFormat,
    at: DateTime<Utc>,
) -> String {
    let timestamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    let scope = if all_pages { "-all-pages" } else { "" };
    format!("{entity}{scope}-export-{timestamp}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_filename_shape() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            export_filename("users", false, ExportFormat::Csv, at),
            "users-export-2024-03-09T14-05-07-000Z.csv"
        );
        assert_eq!(
            export_filename("projects", true, ExportFormat::Excel, at),
            "projects-all-pages-export-2024-03-09T14-05-07-000Z.xlsx"
        );
    }
}
