use clap::Args;
use serde_json::Value;

use card_mix_core::report::{self, ModelInput};

use crate::input::SourceArgs;

/// Arguments for building the recalculation grid
#[derive(Args)]
pub struct ModelArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Show MSF, COA and GP in basis points
    #[arg(long)]
    pub show_bips: bool,

    /// Print only the visible grid rows (for table and csv output)
    #[arg(long)]
    pub grid: bool,

    /// Write the assumption state to this file for later `update` or
    /// `scenario` runs
    #[arg(long)]
    pub save_state: Option<String>,
}

pub fn run_model(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (rows, mut config) = args.source.load("model")?;
    config.show_bips |= args.show_bips;

    let result = report::build_model(&ModelInput { rows, config })?;

    if let Some(ref path) = args.save_state {
        std::fs::write(path, serde_json::to_string_pretty(&result.result.state)?)
            .map_err(|e| format!("Failed to write '{path}': {e}"))?;
        log::info!("saved assumption state to {path}");
    }

    if args.grid {
        return Ok(serde_json::to_value(&result.result.display)?);
    }
    Ok(serde_json::to_value(result)?)
}
