mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::assumptions::UpdateArgs;
use commands::classify::{ApportionArgs, ClassifyArgs};
use commands::incentives::IncentivesArgs;
use commands::model::ModelArgs;
use commands::reports::{PivotArgs, SummaryArgs};
use commands::scenario::ScenarioArgs;

/// Card-mix and rate-assumption model for payments reporting
#[derive(Parser)]
#[command(
    name = "cardmix",
    version,
    about = "Card-mix and rate-assumption model for payments reporting",
    long_about = "Classifies acquirer transactions into card types, apportions Wpay \
                  volume, builds business-unit and merchant card-type tables and \
                  recalculates MSF, COA and GP under edited or preset assumptions."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify payment-method variants into card types
    Classify(ClassifyArgs),
    /// Apportion one Wpay total across the card types
    Apportion(ApportionArgs),
    /// Business-unit totals of TTV, MSF, COA and GP
    Summary(SummaryArgs),
    /// Business unit by card type for one metric
    Pivot(PivotArgs),
    /// Build the card-type recalculation grid
    Model(ModelArgs),
    /// Apply assumption edits to a saved state
    Update(UpdateArgs),
    /// Apply a preset scenario, or compare all of them
    Scenario(ScenarioArgs),
    /// Merchant GP after incentives
    Incentives(IncentivesArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Classify(args) => commands::classify::run_classify(args),
        Commands::Apportion(args) => commands::classify::run_apportion(args),
        Commands::Summary(args) => commands::reports::run_summary(args),
        Commands::Pivot(args) => commands::reports::run_pivot(args),
        Commands::Model(args) => commands::model::run_model(args),
        Commands::Update(args) => commands::assumptions::run_update(args),
        Commands::Scenario(args) => commands::scenario::run_scenario(args),
        Commands::Incentives(args) => commands::incentives::run_incentives(args),
        Commands::Version => {
            println!("cardmix {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
