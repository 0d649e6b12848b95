use serde::{Deserialize, Serialize};

use crate::assumptions::AssumptionState;
use crate::error::CardMixError;
use crate::report::{total_row, ModelTableRow};
use crate::CardMixResult;

/// Number of numbered slots next to the Default row.
pub const SCENARIO_SLOTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSnapshot {
    /// "Default" or "Scenario N"
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    pub totals: ModelTableRow,
}

/// Saved Total rows for side-by-side comparison: the model as loaded plus
/// ten user-filled slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTable {
    pub default: ScenarioSnapshot,
    pub slots: Vec<Option<ScenarioSnapshot>>,
}

impl ScenarioTable {
    /// Seed the Default row from a freshly built state.
    pub fn new(state: &AssumptionState) -> Self {
        ScenarioTable {
            default: ScenarioSnapshot {
                label: "Default".to_string(),
                description: None,
                totals: total_row(state),
            },
            slots: vec![None; SCENARIO_SLOTS],
        }
    }

    /// Store the current Total row in `slot` (1-based), replacing any
    /// earlier save there.
    pub fn save(
        &mut self,
        slot: usize,
        state: &AssumptionState,
        description: Option<String>,
    ) -> CardMixResult<()> {
        if slot == 0 || slot > SCENARIO_SLOTS {
            return Err(CardMixError::InvalidInput {
                field: "slot".into(),
                reason: format!("slot must be between 1 and {SCENARIO_SLOTS}, got {slot}"),
            });
        }
        self.slots[slot - 1] = Some(ScenarioSnapshot {
            label: format!("Scenario {slot}"),
            description,
            totals: total_row(state),
        });
        Ok(())
    }

    pub fn get(&self, slot: usize) -> Option<&ScenarioSnapshot> {
        slot.checked_sub(1)
            .and_then(|i| self.slots.get(i))
            .and_then(Option::as_ref)
    }

    /// Clear every slot; Default stays.
    pub fn reset(&mut self) {
        self.slots = vec![None; SCENARIO_SLOTS];
    }

    /// Default followed by the filled slots in slot order.
    pub fn rows(&self) -> Vec<&ScenarioSnapshot> {
        std::iter::once(&self.default)
            .chain(self.slots.iter().flatten())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{MerchantScope, RowKey};
    use crate::assumptions::{AssumptionRow, ValueSet};
    use crate::scenarios::ScenarioPreset;
    use crate::taxonomy::CardType;
    use rust_decimal_macros::dec;

    fn state() -> AssumptionState {
        let mut v = ValueSet {
            ttv: dec!(1_000_000),
            msf: dec!(8000),
            coa: dec!(3000),
            ..ValueSet::default()
        };
        v.rederive_gp();
        v.rederive_ratios(dec!(1_000_000));
        AssumptionState {
            rows: vec![AssumptionRow {
                key: RowKey::new("Bepoz", MerchantScope::All, CardType::DomesticDebit),
                base: v,
                assumption: v,
            }],
        }
    }

    #[test]
    fn test_save_and_list() {
        let s = state();
        let mut table = ScenarioTable::new(&s);
        let banned = ScenarioPreset::SurchargeBan.apply(&s);
        table.save(3, &banned, Some("surcharge ban".into())).unwrap();

        let rows = table.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "Default");
        assert_eq!(rows[1].label, "Scenario 3");
        assert_eq!(rows[1].totals.msf_assumption, dec!(6500));
        assert_eq!(table.get(3).unwrap().totals.msf, dec!(8000));
        assert!(table.get(0).is_none());
    }

    #[test]
    fn test_slot_bounds() {
        let s = state();
        let mut table = ScenarioTable::new(&s);
        for slot in [0, 11] {
            let err = table.save(slot, &s, None).unwrap_err();
            assert!(matches!(err, CardMixError::InvalidInput { .. }));
        }
        assert!(table.save(10, &s, None).is_ok());
    }

    #[test]
    fn test_reset_keeps_default() {
        let s = state();
        let mut table = ScenarioTable::new(&s);
        table.save(1, &s, None).unwrap();
        table.reset();
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.default.totals.ttv, dec!(1_000_000));
    }
}
