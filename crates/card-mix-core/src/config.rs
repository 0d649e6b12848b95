use serde::{Deserialize, Serialize};

use crate::source::FilterSelection;
use crate::CardMixResult;

/// Dashboard settings: the filter bar plus presentation toggles.
///
/// Every field is optional on the wire; a missing filter means All and a
/// missing toggle means off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(flatten)]
    pub filters: FilterSelection,
    /// Show MSF, COA and GP as basis points instead of dollars
    #[serde(default)]
    pub show_bips: bool,
    /// Report fee measures ex-GST in the business-unit summary
    #[serde(default)]
    pub ex_gst: bool,
}

impl ModelConfig {
    pub fn from_json_str(s: &str) -> CardMixResult<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
