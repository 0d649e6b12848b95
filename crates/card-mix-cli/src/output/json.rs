use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print the full envelope to stdout, Decimal fields as strings.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = serde_json::to_writer_pretty(&mut out, value) {
        eprintln!("JSON serialization error: {e}");
        return;
    }
    let _ = writeln!(out);
}
