//! Result-set rendering for download: CSV with flattened dotted column
//! names, or pretty-printed JSON.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(ApiError::Validation(format!(
                "unsupported export format: {other}"
            ))),
        }
    }
}

pub fn render(documents: &[Value], format: ExportFormat) -> Result<String, ApiError> {
    match format {
        ExportFormat::Csv => Ok(to_csv(documents)),
        ExportFormat::Json => serde_json::to_string_pretty(documents)
            .map_err(|e| ApiError::Store(format!("failed to serialize export: {e}"))),
    }
}

fn to_csv(documents: &[Value]) -> String {
    if documents.is_empty() {
        return String::new();
    }

    let rows: Vec<BTreeMap<String, Value>> = documents.iter().map(flatten).collect();

    // Header union over every row, sorted for a stable column order.
    let mut headers: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    headers.sort();

    let mut csv = String::new();
    csv.push_str(&headers.join(","));
    csv.push('\n');

    for row in &rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|header| {
                row.get(header)
                    .map(|value| escape_csv_field(&scalar_to_string(value)))
                    .unwrap_or_default()
            })
            .collect();
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }

    csv
}

/// Flatten nested objects into dotted keys; arrays stay as one cell.
fn flatten(value: &Value) -> BTreeMap<String, Value> {
    let mut flat = BTreeMap::new();
    if let Value::Object(map) = value {
        for (key, value) in map {
            flatten_into(&mut flat, key.clone(), value);
        }
    }
    flat
}

fn flatten_into(flat: &mut BTreeMap<String, Value>, prefix: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_into(flat, format!("{prefix}.{key}"), value);
            }
        }
        other => {
            flat.insert(prefix, other.clone());
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
