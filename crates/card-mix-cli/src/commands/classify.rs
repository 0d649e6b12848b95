use clap::Args;
use serde::Serialize;
use serde_json::Value;

use card_mix_core::apportionment::wpay::{self, WpayInput};
use card_mix_core::taxonomy::{card_type::known_variants, classify, CardType};

use crate::input;

/// Arguments for card-type classification
#[derive(Args)]
pub struct ClassifyArgs {
    /// Raw payment-method variants, e.g. visapremiumcredit
    pub variants: Vec<String>,

    /// List the whole classification table instead
    #[arg(long)]
    pub table: bool,
}

/// Arguments for Wpay apportionment
#[derive(Args)]
pub struct ApportionArgs {
    /// Path to JSON input file with `total`, `amex` and `eftpos` measures
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Serialize)]
struct Classification {
    variant: String,
    card_type: CardType,
}

pub fn run_classify(args: ClassifyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rows: Vec<Classification> = if args.table {
        known_variants()
            .map(|(variant, card_type)| Classification {
                variant: variant.to_string(),
                card_type,
            })
            .collect()
    } else if args.variants.is_empty() {
        return Err("at least one variant, or --table, required for classify".into());
    } else {
        args.variants
            .into_iter()
            .map(|variant| Classification {
                card_type: classify(&variant),
                variant,
            })
            .collect()
    };
    Ok(serde_json::to_value(rows)?)
}

pub fn run_apportion(args: ApportionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let wpay_input: WpayInput = input::from_file_or_stdin(args.input.as_deref(), "apportion")?;
    let result = wpay::analyze_wpay(&wpay_input)?;
    Ok(serde_json::to_value(result)?)
}
