//! PDF text extraction.

use std::path::Path;

use serde::Serialize;

use super::{read_file, FormatParser, ParsedContent};
use crate::error::ParseError;
use crate::files::FileType;
use crate::pipeline::ProgressReporter;

/// Extracted text plus simple counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentContent {
    pub text: String,
    pub page_count: usize,
    pub word_count: usize,
    pub character_count: usize,
}

impl DocumentContent {
    pub fn new(text: String, page_count: usize) -> Self {
        Self {
            word_count: text.split_whitespace().count(),
            character_count: text.chars().count(),
            text,
            page_count,
        }
    }
}

pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParser for PdfParser {
    fn parse(
        &self,
        path: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<ParsedContent, ParseError> {
        let bytes = read_file(path)?;
        let doc = lopdf::Document::load_mem(&bytes)
            .map_err(|e| ParseError::Pdf(format!("Failed to load PDF: {}", e)))?;

        let pages = doc.get_pages();
        let page_count = pages.len();
        let mut text = String::new();

        for (i, page_num) in pages.keys().enumerate() {
            match doc.extract_text(&[*page_num]) {
                Ok(page_text) => text.push_str(&page_text),
                Err(e) => log::debug!("No text on page {}: {}", page_num, e),
            }
            progress.report(((i + 1) * 100 / page_count) as u8);
        }

        log::debug!("Extracted {} characters from {} pages", text.len(), page_count);
        Ok(ParsedContent::Document(DocumentContent::new(text, page_count)))
    }

    fn supports(&self, file_type: FileType) -> bool {
        matches!(file_type, FileType::Pdf)
    }
}
