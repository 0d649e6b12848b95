pub mod file;
pub mod rows;
pub mod stdin;

use clap::Args;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use card_mix_core::config::ModelConfig;
use card_mix_core::source::TransactionRow;

/// Where transaction rows and dashboard settings come from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Path to a JSON input file holding `rows` and an optional `config`
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a CSV or JSON export of transaction rows
    #[arg(long, conflicts_with = "input")]
    pub rows: Option<String>,

    /// Path to a JSON or YAML model config (filters and toggles)
    #[arg(long)]
    pub config: Option<String>,
}

#[derive(Deserialize)]
struct RowsInput {
    rows: Vec<TransactionRow>,
    #[serde(default)]
    config: ModelConfig,
}

/// Deserialise a command's input from `--input`, or from piped stdin.
pub fn from_file_or_stdin<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_json(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err(format!("--input <file.json> or stdin required for {what}").into())
    }
}

impl SourceArgs {
    /// Rows and config. A `--config` file replaces any config embedded in
    /// the JSON input.
    pub fn load(&self, what: &str) -> Result<(Vec<TransactionRow>, ModelConfig), Box<dyn std::error::Error>> {
        let (rows, embedded) = match &self.rows {
            Some(path) => (rows::load_rows(path)?, ModelConfig::default()),
            None => {
                let input: RowsInput = from_file_or_stdin(self.input.as_deref(), what)?;
                (input.rows, input.config)
            }
        };
        let config = match &self.config {
            Some(path) => file::read_structured(path)?,
            None => embedded,
        };
        Ok((rows, config))
    }
}
