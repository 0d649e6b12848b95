use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use card_mix_core::assumptions::AssumptionState;
use card_mix_core::scenarios::{apply_scenario, ScenarioInput, ScenarioPreset, ScenarioTable};

use crate::input;

/// Arguments for the preset scenarios
#[derive(Args)]
pub struct ScenarioArgs {
    /// Path to a saved assumption state (bare, or as `{ "state": ... }`)
    #[arg(long)]
    pub input: Option<String>,

    /// Preset to apply: 1-5 or a name such as surcharge-ban
    #[arg(long, required_unless_present_any = ["compare", "list"])]
    pub scenario: Option<String>,

    /// Save every preset into slots 1-5 and print the Total rows side by side
    #[arg(long, conflicts_with = "scenario")]
    pub compare: bool,

    /// List the presets
    #[arg(long, conflicts_with_all = ["scenario", "compare"])]
    pub list: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StateFile {
    Wrapped { state: AssumptionState },
    Bare(AssumptionState),
}

#[derive(Serialize)]
struct PresetListing {
    number: u8,
    name: &'static str,
    description: &'static str,
}

fn load_state(path: Option<&str>) -> Result<AssumptionState, Box<dyn std::error::Error>> {
    Ok(match input::from_file_or_stdin::<StateFile>(path, "scenario")? {
        StateFile::Wrapped { state } | StateFile::Bare(state) => state,
    })
}

pub fn run_scenario(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.list {
        let presets: Vec<PresetListing> = ScenarioPreset::ALL
            .iter()
            .map(|p| PresetListing {
                number: p.number(),
                name: p.slug(),
                description: p.description(),
            })
            .collect();
        return Ok(serde_json::to_value(presets)?);
    }

    let state = load_state(args.input.as_deref())?;

    if args.compare {
        let mut table = ScenarioTable::new(&state);
        for preset in ScenarioPreset::ALL {
            let next = preset.apply(&state);
            table.save(
                usize::from(preset.number()),
                &next,
                Some(preset.description().to_string()),
            )?;
        }
        return Ok(serde_json::to_value(table.rows())?);
    }

    let scenario: ScenarioPreset = args
        .scenario
        .as_deref()
        .ok_or("--scenario, --compare or --list required")?
        .parse()?;
    let result = apply_scenario(&ScenarioInput { state, scenario })?;
    Ok(serde_json::to_value(result)?)
}
