pub mod presets;
pub mod snapshots;

pub use presets::{apply_scenario, ScenarioInput, ScenarioPreset};
pub use snapshots::{ScenarioSnapshot, ScenarioTable, SCENARIO_SLOTS};
