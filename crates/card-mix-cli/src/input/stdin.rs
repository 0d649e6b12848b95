use serde_json::Value;
use std::io::{self, Read};

/// Piped input from stdin, as JSON or (failing that) YAML. `None` when stdin
/// is a terminal or the pipe is empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let piped = buffer.trim();
    if piped.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<Value>(piped) {
        Ok(value) => Ok(Some(value)),
        Err(json_err) => {
            log::debug!("stdin is not JSON ({json_err}); trying YAML");
            let value: Value = serde_yaml::from_str(piped)
                .map_err(|e| format!("Failed to parse stdin as JSON or YAML: {e}"))?;
            Ok(Some(value))
        }
    }
}
