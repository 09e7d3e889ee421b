//! Tabular content shared by the CSV and spreadsheet parsers.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Rows keyed by column name plus per-column summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableContent {
    pub rows: Vec<Map<String, Value>>,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<String>,
    /// Inferred type per column: `integer`, `float`, `boolean`, `string` or `empty`.
    pub data_types: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_names: Option<Vec<String>>,
}

impl TableContent {
    /// Builds a table from positional cells. Short rows are padded with nulls.
    pub fn from_rows(columns: Vec<String>, cells: Vec<Vec<Value>>) -> Self {
        let data_types = columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let column = cells.iter().filter_map(|row| row.get(i));
                (name.clone(), column_type(column).to_string())
            })
            .collect();

        let rows: Vec<Map<String, Value>> = cells
            .into_iter()
            .map(|row| {
                let mut values = row.into_iter();
                columns
                    .iter()
                    .map(|name| (name.clone(), values.next().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect();

        Self {
            row_count: rows.len(),
            column_count: columns.len(),
            rows,
            columns,
            data_types,
            sheet_names: None,
        }
    }
}

/// Converts a raw text cell into the narrowest JSON value it represents.
pub fn infer_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(raw.to_string())
}

fn column_type<'a>(values: impl Iterator<Item = &'a Value>) -> &'static str {
    let mut kind: Option<&'static str> = None;

    for value in values {
        let this = match value {
            Value::Null => continue,
            Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
            Value::Number(_) => "float",
            Value::Bool(_) => "boolean",
            _ => "string",
        };
        kind = Some(match (kind, this) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some("integer"), "float") | (Some("float"), "integer") => "float",
            _ => "string",
        });
    }

    kind.unwrap_or("empty")
}

/// Makes header names unique and fills blanks the way spreadsheet tools do.
pub fn normalize_headers(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();

    raw.into_iter()
        .enumerate()
        .map(|(i, name)| {
            let base = if name.trim().is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name.trim().to_string()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{}.{}", base, *count - 1)
            }
        })
        .collect()
}
