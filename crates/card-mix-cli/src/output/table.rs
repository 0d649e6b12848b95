use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten_row, format_cell, grid_headers, grid_rows, result_of};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    if let Some(rows) = grid_rows(value) {
        print_grid(rows);
    } else if let Value::Object(map) = result_of(value) {
        print_fields(map);
    } else {
        println!("{}", format_cell(value, None));
    }

    if let Value::Object(envelope) = value {
        print_footer(envelope);
    }
}

fn print_grid(rows: &[Value]) {
    if rows.is_empty() {
        println!("(no rows)");
        return;
    }
    let flat: Vec<Vec<(String, Value)>> = rows.iter().map(flatten_row).collect();
    let headers = grid_headers(&flat);

    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(String::as_str));
    for row in &flat {
        builder.push_record(headers.iter().map(|h| {
            row.iter()
                .find(|(column, _)| column == h)
                .map(|(_, v)| format_cell(v, Some(2)))
                .unwrap_or_default()
        }));
    }
    println!("{}", Table::from(builder));
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_cell(val, Some(2))]);
    }
    println!("{}", Table::from(builder));
}

fn print_footer(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {w}");
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {meth}");
    }
}
