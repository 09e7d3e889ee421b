//! JSON parser.

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{read_file, FormatParser, ParsedContent};
use crate::error::ParseError;
use crate::files::FileType;
use crate::pipeline::ProgressReporter;

/// Shape summary of a JSON document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonContent {
    Array {
        items: Vec<Value>,
        item_count: usize,
    },
    Object {
        keys: Vec<String>,
        key_count: usize,
        content: Map<String, Value>,
    },
    Primitive {
        value: Value,
    },
}

impl From<Value> for JsonContent {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Array {
                item_count: items.len(),
                items,
            },
            Value::Object(content) => Self::Object {
                keys: content.keys().cloned().collect(),
                key_count: content.len(),
                content,
            },
            value => Self::Primitive { value },
        }
    }
}

pub struct JsonParser;

impl JsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParser for JsonParser {
    fn parse(
        &self,
        path: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<ParsedContent, ParseError> {
        let bytes = read_file(path)?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| ParseError::Json(e.to_string()))?;
        progress.report(100);

        Ok(ParsedContent::Json(value.into()))
    }

    fn supports(&self, file_type: FileType) -> bool {
        matches!(file_type, FileType::Json)
    }
}
