//! Excel parser. Reads the first worksheet; its first row is the header.

use std::path::Path;

use calamine::{Data, Reader};
use serde_json::{Number, Value};

use super::table::{normalize_headers, TableContent};
use super::{FormatParser, ParsedContent};
use crate::error::ParseError;
use crate::files::FileType;
use crate::pipeline::ProgressReporter;

pub struct ExcelParser;

impl ExcelParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExcelParser {
    fn default() -> Self {
        Self::new()
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::Number((*i).into()),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                Value::Number((*f as i64).into())
            } else {
                Number::from_f64(*f).map_or(Value::Null, Value::Number)
            }
        }
        Data::String(s) => Value::String(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        other => Value::String(other.to_string()),
    }
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Builds a table from worksheet rows, treating the first as the header.
fn table_from_rows<'a>(
    mut rows: impl Iterator<Item = &'a [Data]>,
    height: usize,
    progress: &dyn ProgressReporter,
) -> TableContent {
    let total = height.max(1);
    let Some(header) = rows.next() else {
        return TableContent::from_rows(Vec::new(), Vec::new());
    };
    let columns = normalize_headers(header.iter().map(header_name));

    let mut cells = Vec::new();
    for (i, row) in rows.enumerate() {
        let values: Vec<Value> = row.iter().map(cell_value).collect();
        if values.iter().all(Value::is_null) {
            continue;
        }
        cells.push(values);
        progress.report(((i + 2) * 100 / total).min(100) as u8);
    }

    TableContent::from_rows(columns, cells)
}

impl FormatParser for ExcelParser {
    fn parse(
        &self,
        path: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<ParsedContent, ParseError> {
        let mut workbook =
            calamine::open_workbook_auto(path).map_err(|e| ParseError::Excel(e.to_string()))?;

        let sheet_names = workbook.sheet_names().to_vec();
        let first = sheet_names
            .first()
            .ok_or_else(|| ParseError::Excel("Workbook has no worksheets".to_string()))?;

        let range = workbook
            .worksheet_range(first)
            .map_err(|e| ParseError::Excel(e.to_string()))?;

        let mut table = table_from_rows(range.rows(), range.height(), progress);
        table.sheet_names = Some(sheet_names);
        progress.report(100);

        log::debug!(
            "Parsed worksheet with {} rows and {} columns",
            table.row_count,
            table.column_count
        );
        Ok(ParsedContent::Table(table))
    }

    fn supports(&self, file_type: FileType) -> bool {
        matches!(file_type, FileType::Excel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::NoopProgress;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_table_from_rows() {
        let rows: Vec<Vec<Data>> = vec![
            vec![Data::String("item".into()), Data::String("count".into())],
            vec![Data::String("bolt".into()), Data::Float(4.0)],
            vec![Data::Empty, Data::Empty],
            vec![Data::String("nut".into()), Data::Int(12)],
        ];

        let table = table_from_rows(rows.iter().map(Vec::as_slice), rows.len(), &NoopProgress);

        assert_eq!(table.columns, vec!["item", "count"]);
        assert_eq!(table.row_count, 2);
        assert_eq!(table.rows[0]["count"], json!(4));
        assert_eq!(table.rows[1]["item"], json!("nut"));
        assert_eq!(table.data_types["count"], "integer");
    }

    #[test]
    fn test_blank_header_cells_are_named() {
        let rows: Vec<Vec<Data>> = vec![
            vec![Data::String("a".into()), Data::Empty],
            vec![Data::Bool(true), Data::Float(0.5)],
        ];

        let table = table_from_rows(rows.iter().map(Vec::as_slice), rows.len(), &NoopProgress);

        assert_eq!(table.columns, vec!["a", "Unnamed: 1"]);
        assert_eq!(table.data_types["a"], "boolean");
        assert_eq!(table.data_types["Unnamed: 1"], "float");
    }

    #[test]
    fn test_empty_sheet() {
        let rows: Vec<Vec<Data>> = Vec::new();
        let table = table_from_rows(rows.iter().map(Vec::as_slice), rows.len(), &NoopProgress);
        assert_eq!(table.row_count, 0);
        assert_eq!(table.column_count, 0);
    }

    #[test]
    fn test_garbage_file_is_excel_error() {
        let mut file = NamedTempFile::with_suffix(".xlsx").unwrap();
        file.write_all(b"definitely not a workbook").unwrap();

        let err = ExcelParser::new()
            .parse(file.path(), &NoopProgress)
            .unwrap_err();
        assert!(matches!(err, ParseError::Excel(_)));
    }
}
