use serde_json::Value;

use super::cell;

/// Print just the key answer value from the output.
///
/// Looks for the headline field of each command in priority order, then
/// falls back to the first field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "overdue_amount",
        "total_overdue",
        "remaining_amount",
        "total_count",
        "id",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", cell(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, cell(val));
            return;
        }
    }

    println!("{}", cell(result_obj));
}
