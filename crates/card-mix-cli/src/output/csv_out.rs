use serde_json::Value;
use std::io;

use super::{flatten_row, format_cell, grid_headers, grid_rows, result_of};

/// Write output as CSV to stdout. Grids get one column per field; anything
/// else is written as field,value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some(rows) = grid_rows(value) {
        let flat: Vec<Vec<(String, Value)>> = rows.iter().map(flatten_row).collect();
        let headers = grid_headers(&flat);
        let _ = wtr.write_record(&headers);
        for row in &flat {
            let record: Vec<String> = headers
                .iter()
                .map(|h| {
                    row.iter()
                        .find(|(column, _)| column == h)
                        .map(|(_, v)| format_cell(v, None))
                        .unwrap_or_default()
                })
                .collect();
            let _ = wtr.write_record(&record);
        }
    } else if let Value::Object(map) = result_of(value) {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in map {
            let _ = wtr.write_record([key.as_str(), &format_cell(val, None)]);
        }
    } else {
        let _ = wtr.write_record([&format_cell(value, None)]);
    }

    let _ = wtr.flush();
}
