use serde::de::DeserializeOwned;
use serde::Deserialize;

use card_mix_core::source::TransactionRow;

use super::file::{has_extension, read_structured, read_text};

/// JSON row files are either a bare array or wrapped as `{ "rows": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RowFile<T> {
    Bare(Vec<T>),
    Wrapped { rows: Vec<T> },
}

/// Load records from a CSV export or a JSON file. CSV headers may use the
/// warehouse's upper-case column names.
pub fn load_records<T: DeserializeOwned>(path: &str) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    if has_extension(path, &["csv"]) {
        let (canonical, contents) = read_text(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes());
        let mut records = Vec::new();
        for (i, record) in reader.deserialize::<T>().enumerate() {
            let record = record
                .map_err(|e| format!("{}: row {}: {}", canonical.display(), i + 2, e))?;
            records.push(record);
        }
        Ok(records)
    } else {
        Ok(match read_structured::<RowFile<T>>(path)? {
            RowFile::Bare(rows) | RowFile::Wrapped { rows } => rows,
        })
    }
}

pub fn load_rows(path: &str) -> Result<Vec<TransactionRow>, Box<dyn std::error::Error>> {
    let rows: Vec<TransactionRow> = load_records(path)?;
    log::info!("loaded {} transaction rows from {path}", rows.len());
    Ok(rows)
}
