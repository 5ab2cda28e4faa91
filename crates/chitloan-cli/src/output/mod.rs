pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Pretty-print JSON to stdout.
fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// The row set of a result object: the first field holding an array of
/// objects (schedule `items`, sweep `refreshed`, ...).
pub(crate) fn row_field(result: &Map<String, Value>) -> Option<(&str, &[Value])> {
    result.iter().find_map(|(key, val)| match val {
        Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {
            Some((key.as_str(), rows.as_slice()))
        }
        _ => None,
    })
}

/// Render a scalar-ish value as a single cell.
pub(crate) fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(cell).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Column headers for a row set, taken from the first row.
pub(crate) fn headers(rows: &[Value]) -> Vec<String> {
    match rows.first() {
        Some(Value::Object(first)) => first.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

/// One row's cells in header order; missing fields are blank.
pub(crate) fn row_cells(row: &Value, headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .map(|h| row.get(h.as_str()).map(cell).unwrap_or_default())
        .collect()
}
