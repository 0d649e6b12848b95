use serde_json::Value;

use super::{format_cell, result_of};

/// Print just the headline figure of a result.
///
/// Looks for the Total row first (model grid, summary, pivot), then a few
/// well-known fields, then falls back to the first field.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    let total = result
        .pointer("/table/total")
        .or_else(|| result.get("total"));
    if let Some(total) = total {
        for key in ["GP(Assumption)", "gp", "row_total", "ttv"] {
            if let Some(val) = total.get(key).filter(|v| !v.is_null()) {
                println!("{}", format_cell(val, Some(2)));
                return;
            }
        }
    }

    let priority_keys = ["remainder", "by_card_type"];
    if let Value::Object(map) = result {
        for key in priority_keys {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                println!("{}", format_cell(val, Some(2)));
                return;
            }
        }
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_cell(val, Some(2)));
            return;
        }
    }

    println!("{}", format_cell(result, Some(2)));
}
