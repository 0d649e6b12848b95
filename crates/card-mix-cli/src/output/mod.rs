pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Array fields that hold a command's main grid, in lookup order.
const GRID_KEYS: [&str; 4] = ["display", "rows", "merchants", "business_units"];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The `result` object of an envelope, or the value itself.
pub(crate) fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// The rows worth printing as a grid: a bare array, or the first array
/// field of the result named in [`GRID_KEYS`].
pub(crate) fn grid_rows(value: &Value) -> Option<&[Value]> {
    match result_of(value) {
        Value::Array(arr) => Some(arr.as_slice()),
        Value::Object(map) => GRID_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_array))
            .map(Vec::as_slice),
        _ => None,
    }
}

/// One grid row as ordered (column, cell) pairs. Nested objects such as a
/// pivot's per-card-type values or a snapshot's totals are spread into
/// their own columns.
pub(crate) fn flatten_row(row: &Value) -> Vec<(String, Value)> {
    let mut cells = Vec::new();
    if let Value::Object(map) = row {
        spread(map, None, &mut cells);
    } else {
        cells.push(("value".to_string(), row.clone()));
    }
    cells
}

fn spread(map: &Map<String, Value>, prefix: Option<&str>, cells: &mut Vec<(String, Value)>) {
    for (key, val) in map {
        let column = match prefix {
            Some(p) if p != "values" && p != "totals" => format!("{p}.{key}"),
            _ => key.clone(),
        };
        match val {
            Value::Object(inner) => spread(inner, Some(key.as_str()), cells),
            other => cells.push((column, other.clone())),
        }
    }
}

/// Column headers across every row, first-seen order.
pub(crate) fn grid_headers(rows: &[Vec<(String, Value)>]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for (column, _) in row {
            if !headers.contains(column) {
                headers.push(column.clone());
            }
        }
    }
    headers
}

/// Plain-text cell. Decimal strings print with at most `dp` places.
pub(crate) fn format_cell(value: &Value, dp: Option<u32>) -> String {
    match value {
        Value::String(s) => match (dp, s.parse::<rust_decimal::Decimal>()) {
            (Some(dp), Ok(d)) => d.round_dp(dp).normalize().to_string(),
            _ => s.clone(),
        },
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr
            .iter()
            .map(|v| format_cell(v, dp))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grid_rows_prefers_display() {
        let v = json!({"result": {"display": [{"TTV": "1"}], "table": {"rows": []}}});
        assert_eq!(grid_rows(&v).map(<[Value]>::len), Some(1));
    }

    #[test]
    fn test_flatten_spreads_pivot_values() {
        let row = json!({"business_unit": "Bepoz", "values": {"Amex": "10", "Dom.DR": "5"}});
        let cells = flatten_row(&row);
        let columns: Vec<&str> = cells.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(columns, vec!["business_unit", "Amex", "Dom.DR"]);
    }

    #[test]
    fn test_flatten_prefixes_other_objects() {
        let row = json!({"share_of_row": {"Amex": "50"}});
        assert_eq!(flatten_row(&row)[0].0, "share_of_row.Amex");
    }

    #[test]
    fn test_format_cell_rounds_decimals() {
        assert_eq!(format_cell(&json!("1234.5678"), Some(2)), "1234.57");
        assert_eq!(format_cell(&json!("Dom.CR"), Some(2)), "Dom.CR");
        assert_eq!(format_cell(&json!("10.00"), Some(2)), "10");
    }
}
