//! CSV parser.

use std::path::Path;

use serde_json::Value;

use super::table::{infer_cell, normalize_headers, TableContent};
use super::{read_file, FormatParser, ParsedContent};
use crate::error::ParseError;
use crate::files::FileType;
use crate::pipeline::ProgressReporter;

/// Parses comma-separated files with a header row.
pub struct CsvParser;

impl CsvParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParser for CsvParser {
    fn parse(
        &self,
        path: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<ParsedContent, ParseError> {
        let data = read_file(path)?;
        let total = data.len().max(1);

        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data.as_slice());

        let headers = reader
            .headers()
            .map_err(|e| ParseError::Csv(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(ParseError::Csv("No columns to parse from file".to_string()));
        }
        let columns = normalize_headers(headers);

        let mut cells: Vec<Vec<Value>> = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| ParseError::Csv(e.to_string()))?;
            cells.push(record.iter().map(infer_cell).collect());

            if let Some(pos) = record.position() {
                progress.report((pos.byte() as usize * 100 / total).min(100) as u8);
            }
        }

        let table = TableContent::from_rows(columns, cells);
        progress.report(100);

        log::debug!(
            "Parsed CSV with {} rows and {} columns",
            table.row_count,
            table.column_count
        );
        Ok(ParsedContent::Table(table))
    }

    fn supports(&self, file_type: FileType) -> bool {
        matches!(file_type, FileType::Csv)
    }
}
