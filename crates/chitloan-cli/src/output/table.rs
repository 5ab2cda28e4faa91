use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, headers, row_cells, row_field};

/// Format output as tables using the tabled crate.
///
/// Scalar result fields go into a Field/Value table; a row set such as the
/// schedule's `items` is printed as its own table underneath.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                print_result(result);
                print_envelope_notes(map);
            }
            _ => print_fields(map, None),
        },
        Value::Array(rows) => print_rows(rows),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Map<String, Value>) {
    let rows = row_field(result);
    print_fields(result, rows.map(|(key, _)| key));

    if let Some((key, rows)) = rows {
        println!("\n{}:", key);
        print_rows(rows);
    }
}

fn print_fields(map: &Map<String, Value>, skip: Option<&str>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if Some(key.as_str()) == skip {
            continue;
        }
        builder.push_record([key.as_str(), display(val).as_str()]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    let headers = headers(rows);
    if headers.is_empty() {
        for item in rows {
            println!("{}", display(item));
        }
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        builder.push_record(row_cells(row, &headers));
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        _ => cell(value),
    }
}
