//! Format parsers: turn an uploaded artifact into structured content.

pub mod delimited;
pub mod json;
pub mod pdf;
pub mod spreadsheet;
pub mod table;

use std::path::Path;

use serde::Serialize;

use crate::error::ParseError;
use crate::files::{FileMetadata, FileType};
use crate::pipeline::ProgressReporter;

pub use json::JsonContent;
pub use pdf::DocumentContent;
pub use table::TableContent;

/// Structured result of a successful parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedContent {
    Table(TableContent),
    Document(DocumentContent),
    Json(JsonContent),
}

impl ParsedContent {
    pub fn row_count(&self) -> Option<usize> {
        match self {
            Self::Table(table) => Some(table.row_count),
            _ => None,
        }
    }

    pub fn column_count(&self) -> Option<usize> {
        match self {
            Self::Table(table) => Some(table.column_count),
            _ => None,
        }
    }

    pub fn page_count(&self) -> Option<usize> {
        match self {
            Self::Document(doc) => Some(doc.page_count),
            _ => None,
        }
    }

    /// Metadata summary stored alongside the content.
    pub fn metadata(&self, file_type: FileType, processing_time: i64) -> FileMetadata {
        FileMetadata {
            file_type,
            processing_time,
            row_count: self.row_count(),
            column_count: self.column_count(),
            page_count: self.page_count(),
        }
    }
}

/// Parses one file format.
///
/// Parsers may call `progress.report` with their own completion in
/// `0..=100`; the caller maps it onto the overall run.
pub trait FormatParser: Send + Sync {
    fn parse(
        &self,
        path: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<ParsedContent, ParseError>;

    fn supports(&self, file_type: FileType) -> bool;
}

/// Routes a file to the parser registered for its type.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn FormatParser>>,
}

impl ParserRegistry {
    /// Registry with the CSV, spreadsheet, PDF and JSON parsers.
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(delimited::CsvParser::new()),
                Box::new(spreadsheet::ExcelParser::new()),
                Box::new(pdf::PdfParser::new()),
                Box::new(json::JsonParser::new()),
            ],
        }
    }

    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Adds a parser. Earlier registrations win for overlapping types.
    pub fn register(&mut self, parser: Box<dyn FormatParser>) {
        self.parsers.push(parser);
    }

    pub fn with_parser(mut self, parser: Box<dyn FormatParser>) -> Self {
        self.register(parser);
        self
    }

    pub fn parse(
        &self,
        path: &Path,
        file_type: FileType,
        progress: &dyn ProgressReporter,
    ) -> Result<ParsedContent, ParseError> {
        let parser = self
            .parsers
            .iter()
            .find(|p| p.supports(file_type))
            .ok_or_else(|| ParseError::UnsupportedType(file_type.to_string()))?;

        let _span = tracing::info_span!("parser", file_type = %file_type).entered();
        parser.parse(path, progress)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, ParseError> {
    std::fs::read(path).map_err(|e| ParseError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}
