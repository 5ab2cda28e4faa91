use serde_json::Value;
use std::io;

use super::{cell, headers, row_cells, row_field};

type StdoutCsv<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// A result carrying a row set (schedule periods, swept loans) is written one
/// row per record, ready for spreadsheet import; anything else becomes a
/// two-column field/value sheet.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let outcome = match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => match row_field(result) {
                Some((_, rows)) => write_rows(&mut wtr, rows),
                None => write_fields(&mut wtr, result),
            },
            _ => write_fields(&mut wtr, map),
        },
        Value::Array(rows) => write_rows(&mut wtr, rows),
        _ => wtr.write_record([cell(value)]),
    };

    if let Err(e) = outcome.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV write error: {}", e);
    }
}

fn write_fields(wtr: &mut StdoutCsv<'_>, map: &serde_json::Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), cell(val).as_str()])?;
    }
    Ok(())
}

fn write_rows(wtr: &mut StdoutCsv<'_>, rows: &[Value]) -> csv::Result<()> {
    let headers = headers(rows);
    if headers.is_empty() {
        for item in rows {
            wtr.write_record([cell(item)])?;
        }
        return Ok(());
    }

    wtr.write_record(&headers)?;
    for row in rows {
        wtr.write_record(row_cells(row, &headers))?;
    }
    Ok(())
}
