use clap::Args;
use serde_json::Value;

use card_mix_core::aggregation::pivot::{self, PivotInput, PivotMetric};
use card_mix_core::aggregation::summary::{self, SummaryInput};

use crate::input::SourceArgs;

/// Arguments for the business-unit summary
#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Report MSF, COA and GP ex-GST
    #[arg(long)]
    pub ex_gst: bool,
}

/// Arguments for the card-type pivot
#[derive(Args)]
pub struct PivotArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Metric: ttv, msf, coa, gp or surcharge
    #[arg(long, default_value = "ttv")]
    pub metric: String,
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (rows, mut config) = args.source.load("summary")?;
    config.ex_gst |= args.ex_gst;
    let result = summary::analyze_business_units(&SummaryInput { rows, config })?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_pivot(args: PivotArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let metric: PivotMetric = args.metric.parse()?;
    let (rows, config) = args.source.load("pivot")?;
    let result = pivot::analyze_pivot(&PivotInput {
        rows,
        metric,
        config,
    })?;
    Ok(serde_json::to_value(result)?)
}
