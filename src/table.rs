//! Materializes downloaded result bytes into rows and columns.

use std::io::Cursor;
use std::path::Path;

use calamine::{Reader, open_workbook_auto_from_rs};

use crate::error::Error;

/// File formats validation results can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Comma-delimited text.
    Delimited,
    /// Excel workbook (`.xlsx` or `.xls`).
    Spreadsheet,
}

impl TableFormat {
    /// Guesses the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_lowercase()
            .as_str()
        {
            "csv" => Some(TableFormat::Delimited),
            "xlsx" | "xls" => Some(TableFormat::Spreadsheet),
            _ => None,
        }
    }

    /// Guesses the format from a declared content type.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let ct = content_type.to_lowercase();
        if ct.contains("spreadsheetml") || ct.contains("excel") {
            Some(TableFormat::Spreadsheet)
        } else if ct.contains("csv") || ct.contains("text/") {
            Some(TableFormat::Delimited)
        } else {
            None
        }
    }
}

/// Column-named rows parsed from a results file.
///
/// Cells are kept as the strings the decoder produced; no type coercion is
/// applied on top.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Parses `bytes` according to `format`.
    ///
    /// With no declared format the bytes are tried as delimited text first
    /// and as a spreadsheet second; if both fail, the error reports the
    /// delimited attempt's failure.
    pub fn parse(bytes: &[u8], format: Option<TableFormat>) -> crate::Result<Self> {
        match format {
            Some(TableFormat::Delimited) => parse_delimited(bytes).map_err(content_error),
            Some(TableFormat::Spreadsheet) => parse_spreadsheet(bytes).map_err(content_error),
            None => match parse_delimited(bytes) {
                Ok(table) => Ok(table),
                Err(csv_err) => {
                    parse_spreadsheet(bytes).map_err(|_| content_error(csv_err))
                }
            },
        }
    }

    /// Parses bytes read back from `path`, picking the format by extension.
    /// Unrecognized extensions are treated as delimited text.
    pub fn parse_file(path: &Path, bytes: &[u8]) -> crate::Result<Self> {
        let format = TableFormat::from_path(path).unwrap_or(TableFormat::Delimited);
        let parsed = match format {
            TableFormat::Delimited => parse_delimited(bytes),
            TableFormat::Spreadsheet => parse_spreadsheet(bytes),
        };
        parsed.map_err(|e| Error::api(format!("Error parsing result file: {}", e)))
    }

    /// Reads and parses a results file from disk.
    pub fn read_file(path: &Path) -> crate::Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse_file(path, &bytes)
    }

    /// Column names, in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows, excluding the header row.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at `row` in the named column.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

fn content_error(underlying: String) -> Error {
    Error::api(format!("Error parsing file content: {}", underlying))
}

fn parse_delimited(bytes: &[u8]) -> Result<DataTable, String> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        rows.push(record.iter().map(String::from).collect());
    }

    Ok(DataTable { headers, rows })
}

fn parse_spreadsheet(bytes: &[u8]) -> Result<DataTable, String> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| e.to_string())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook contains no sheets".to_string())?
        .map_err(|e| e.to_string())?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();

    Ok(DataTable {
        headers,
        rows: rows.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] =
        b"email,is_valid,status\nvalid@example.com,True,valid\ninvalid@example.com,False,invalid";

    #[test]
    fn parses_delimited_results() {
        let table = DataTable::parse(SAMPLE, None).unwrap();
        assert_eq!(table.headers(), ["email", "is_valid", "status"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "email"), Some("valid@example.com"));
        assert_eq!(table.get(1, "status"), Some("invalid"));
        assert_eq!(table.get(2, "email"), None);
        assert_eq!(table.get(0, "missing"), None);
    }

    #[test]
    fn round_trips_a_known_row_set() {
        let rows = [
            ("a@example.com", "True"),
            ("b@example.com", "False"),
            ("c@example.com", "True"),
        ];
        let mut text = String::from("email,is_valid\n");
        for (email, valid) in rows {
            text.push_str(&format!("{},{}\n", email, valid));
        }

        let table = DataTable::parse(text.as_bytes(), Some(TableFormat::Delimited)).unwrap();
        assert_eq!(table.len(), rows.len());
        for (i, (email, valid)) in rows.iter().enumerate() {
            assert_eq!(table.get(i, "email"), Some(*email));
            assert_eq!(table.get(i, "is_valid"), Some(*valid));
        }
    }

    #[test]
    fn unparsable_bytes_report_the_delimited_error() {
        // Invalid UTF-8 that is also not a workbook.
        let bytes = [0xff, 0xfe, 0x00, 0x01, 0x02, 0x03];
        let err = DataTable::parse(&bytes, None).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Api);
        assert!(err.message().starts_with("Error parsing file content:"));
    }

    #[test]
    fn declared_spreadsheet_skips_the_delimited_attempt() {
        // Parses fine as CSV, but the declared format forces the workbook path.
        let err = DataTable::parse(SAMPLE, Some(TableFormat::Spreadsheet)).unwrap_err();
        assert!(err.message().starts_with("Error parsing file content:"));
    }

    #[test]
    fn result_file_errors_use_the_file_wording() {
        let bytes = [0xff, 0xfe, 0x00, 0x01];
        let err = DataTable::parse_file(Path::new("results.csv"), &bytes).unwrap_err();
        assert!(err.message().starts_with("Error parsing result file:"));
    }

    #[test]
    fn format_is_inferred_from_extensions() {
        assert_eq!(
            TableFormat::from_path(Path::new("out.csv")),
            Some(TableFormat::Delimited)
        );
        assert_eq!(
            TableFormat::from_path(Path::new("out.XLSX")),
            Some(TableFormat::Spreadsheet)
        );
        assert_eq!(
            TableFormat::from_path(Path::new("out.xls")),
            Some(TableFormat::Spreadsheet)
        );
        assert_eq!(TableFormat::from_path(Path::new("out.bin")), None);
        assert_eq!(TableFormat::from_path(Path::new("out")), None);
    }

    #[test]
    fn format_is_inferred_from_content_types() {
        assert_eq!(
            TableFormat::from_content_type("text/csv; charset=utf-8"),
            Some(TableFormat::Delimited)
        );
        assert_eq!(
            TableFormat::from_content_type(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            ),
            Some(TableFormat::Spreadsheet)
        );
        assert_eq!(
            TableFormat::from_content_type("application/vnd.ms-excel"),
            Some(TableFormat::Spreadsheet)
        );
        assert_eq!(TableFormat::from_content_type("application/octet-stream"), None);
    }

    #[test]
    fn missing_result_file_maps_to_not_found() {
        let err = DataTable::read_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
    }
}
