use clap::Args;
use serde_json::Value;

use card_mix_core::incentives::{analyze_incentives, IncentiveInput, IncentiveRecord};

use crate::input::{self, SourceArgs};

/// Arguments for merchant GP after incentives
#[derive(Args)]
pub struct IncentivesArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// CSV or JSON export of merchant incentives; added to any embedded in
    /// the JSON input
    #[arg(long)]
    pub incentives: Option<String>,
}

pub fn run_incentives(args: IncentivesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut incentive_input = if args.source.rows.is_some() {
        let (rows, config) = args.source.load("incentives")?;
        IncentiveInput {
            rows,
            incentives: Vec::new(),
            config,
        }
    } else {
        let mut parsed: IncentiveInput =
            input::from_file_or_stdin(args.source.input.as_deref(), "incentives")?;
        if let Some(ref path) = args.source.config {
            parsed.config = input::file::read_structured(path)?;
        }
        parsed
    };

    if let Some(ref path) = args.incentives {
        let records: Vec<IncentiveRecord> = input::rows::load_records(path)?;
        log::info!("loaded {} incentive records from {path}", records.len());
        incentive_input.incentives.extend(records);
    }

    let result = analyze_incentives(&incentive_input)?;
    Ok(serde_json::to_value(result)?)
}
