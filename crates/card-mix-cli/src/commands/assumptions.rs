use clap::Args;
use serde_json::Value;

use card_mix_core::aggregation::{MerchantScope, RowKey};
use card_mix_core::assumptions::{
    engine, parse_assumption_value, AssumptionEdit, RateMetric, UpdateInput,
};
use card_mix_core::taxonomy::CardType;

use crate::input;

/// Arguments for assumption edits
#[derive(Args)]
pub struct UpdateArgs {
    /// Path to JSON input file with `state` and optional `edits`
    #[arg(long)]
    pub input: Option<String>,

    /// Extra percent edit, e.g. "Bepoz/All/Dom.CR=30%"
    #[arg(long = "percent", value_name = "KEY=PCT")]
    pub percents: Vec<String>,

    /// Extra MSF rate edit in bips, e.g. "Bepoz/All/Dom.CR=120"
    #[arg(long = "msf-bips", value_name = "KEY=BIPS")]
    pub msf_bips: Vec<String>,

    /// Extra COA rate edit in bips
    #[arg(long = "coa-bips", value_name = "KEY=BIPS")]
    pub coa_bips: Vec<String>,

    /// Print only the edited state, without the envelope
    #[arg(long)]
    pub state_only: bool,
}

/// Split "business unit/merchant/card type=value" into a row key and the
/// raw value text.
fn parse_keyed(arg: &str) -> Result<(RowKey, &str), Box<dyn std::error::Error>> {
    let (key, value) = arg
        .rsplit_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{arg}'"))?;
    let parts: Vec<&str> = key.split('/').map(str::trim).collect();
    let [business_unit, merchant, card_type] = parts[..] else {
        return Err(format!("key must be 'business unit/merchant/card type', got '{key}'").into());
    };
    let card_type: CardType = card_type.parse()?;
    Ok((
        RowKey::new(business_unit, MerchantScope::from(merchant.to_string()), card_type),
        value,
    ))
}

pub fn run_update(args: UpdateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut update: UpdateInput = input::from_file_or_stdin(args.input.as_deref(), "update")?;

    for arg in &args.percents {
        let (key, value) = parse_keyed(arg)?;
        update.edits.push(AssumptionEdit::Percent {
            key,
            pct: parse_assumption_value(value),
        });
    }
    for (metric, list) in [(RateMetric::Msf, &args.msf_bips), (RateMetric::Coa, &args.coa_bips)] {
        for arg in list {
            let (key, value) = parse_keyed(arg)?;
            update.edits.push(AssumptionEdit::Rate {
                key,
                metric,
                bips: parse_assumption_value(value),
            });
        }
    }
    log::info!("applying {} assumption edits", update.edits.len());

    let result = engine::update_assumptions(&update)?;
    if args.state_only {
        return Ok(serde_json::to_value(&result.result)?);
    }
    Ok(serde_json::to_value(result)?)
}
