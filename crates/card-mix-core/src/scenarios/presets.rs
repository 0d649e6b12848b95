use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

use crate::assumptions::{AssumptionRow, AssumptionState};
use crate::error::CardMixError;
use crate::taxonomy::{
    lookup, CHURN_RETENTION, CREDIT_COA_REDUCTION_BIPS, CREDIT_INCREASE_MSF_BIPS,
    DEBIT_SURCHARGE_BAN_MSF_BIPS, TARGET_CARD_MIX_PCT,
};
use crate::types::{from_bips, with_metadata, Bips, ComputationOutput, PERCENT_SCALE};
use crate::CardMixResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The five fixed what-if presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScenarioPreset {
    /// Debit MSF drops to 65 bips once surcharging is banned.
    SurchargeBan,
    /// Surcharge ban plus higher MSF on credit and international cards.
    CreditIncrease,
    /// Credit MSF rates with negotiated COA reductions.
    ReduceCreditCoa,
    /// Fixed target card mix applied to each group's base TTV.
    CardMix,
    /// Target card mix after losing 15% of volume.
    Churn,
}

impl ScenarioPreset {
    pub const ALL: [ScenarioPreset; 5] = [
        ScenarioPreset::SurchargeBan,
        ScenarioPreset::CreditIncrease,
        ScenarioPreset::ReduceCreditCoa,
        ScenarioPreset::CardMix,
        ScenarioPreset::Churn,
    ];

    pub fn number(&self) -> u8 {
        match self {
            ScenarioPreset::SurchargeBan => 1,
            ScenarioPreset::CreditIncrease => 2,
            ScenarioPreset::ReduceCreditCoa => 3,
            ScenarioPreset::CardMix => 4,
            ScenarioPreset::Churn => 5,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            ScenarioPreset::SurchargeBan => "surcharge-ban",
            ScenarioPreset::CreditIncrease => "credit-increase",
            ScenarioPreset::ReduceCreditCoa => "reduce-credit-coa",
            ScenarioPreset::CardMix => "card-mix",
            ScenarioPreset::Churn => "churn",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScenarioPreset::SurchargeBan => "No surcharge: debit MSF at 65 bips",
            ScenarioPreset::CreditIncrease => "No surcharge and credit MSF increase",
            ScenarioPreset::ReduceCreditCoa => "Credit MSF increase with reduced credit COA",
            ScenarioPreset::CardMix => "Target card mix",
            ScenarioPreset::Churn => "Target card mix with 15% churn",
        }
    }

    pub fn apply(&self, state: &AssumptionState) -> AssumptionState {
        match self {
            ScenarioPreset::SurchargeBan => surcharge_ban(state),
            ScenarioPreset::CreditIncrease => credit_increase(state),
            ScenarioPreset::ReduceCreditCoa => reduce_credit_coa(state),
            ScenarioPreset::CardMix => card_mix(state),
            ScenarioPreset::Churn => churn(state),
        }
    }
}

impl std::fmt::Display for ScenarioPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Scenario {} ({})", self.number(), self.slug())
    }
}

impl FromStr for ScenarioPreset {
    type Err = CardMixError;

    /// Accepts "1".."5", "scenario 3", "scenario-3" or a slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        let norm = norm.strip_prefix("scenario-").unwrap_or(&norm);
        ScenarioPreset::ALL
            .into_iter()
            .find(|p| p.number().to_string() == norm || p.slug() == norm)
            .ok_or_else(|| CardMixError::UnknownScenario(s.to_string()))
    }
}

impl TryFrom<String> for ScenarioPreset {
    type Error = CardMixError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ScenarioPreset> for String {
    fn from(preset: ScenarioPreset) -> Self {
        preset.slug().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub state: AssumptionState,
    pub scenario: ScenarioPreset,
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// MSF rate priced on base TTV.
fn price_msf(row: &mut AssumptionRow, bips: Bips) {
    let a = &mut row.assumption;
    a.msf_bips = bips;
    a.msf = from_bips(row.base.ttv, bips);
    a.rederive_gp();
}

fn apply_credit_msf(state: &mut AssumptionState) {
    for row in &mut state.rows {
        if let Some(bips) = lookup(&CREDIT_INCREASE_MSF_BIPS, row.key.card_type) {
            price_msf(row, bips);
        }
    }
}

fn surcharge_ban(state: &AssumptionState) -> AssumptionState {
    let mut next = state.clone();
    for row in next.rows.iter_mut().filter(|r| r.key.card_type.is_debit()) {
        price_msf(row, DEBIT_SURCHARGE_BAN_MSF_BIPS);
    }
    next
}

fn credit_increase(state: &AssumptionState) -> AssumptionState {
    let mut next = surcharge_ban(state);
    apply_credit_msf(&mut next);
    next
}

/// COA is re-priced on the assumption TTV while MSF stays on base TTV.
fn reduce_credit_coa(state: &AssumptionState) -> AssumptionState {
    let mut next = state.clone();
    apply_credit_msf(&mut next);
    for row in &mut next.rows {
        if let Some(reduction) = lookup(&CREDIT_COA_REDUCTION_BIPS, row.key.card_type) {
            let a = &mut row.assumption;
            a.coa_bips = a.coa_bips.saturating_sub(reduction);
            a.coa = from_bips(a.ttv, a.coa_bips);
            a.rederive_gp();
        }
    }
    next
}

fn card_mix(state: &AssumptionState) -> AssumptionState {
    let parents = state.parent_totals();
    let mut next = state.clone();
    for (row, parent_ttv) in next.rows.iter_mut().zip(parents) {
        if let Some(pct) = lookup(&TARGET_CARD_MIX_PCT, row.key.card_type) {
            let a = &mut row.assumption;
            a.pct_of_parent = pct;
            a.ttv = (pct / PERCENT_SCALE).saturating_mul(parent_ttv);
            a.msf = from_bips(a.ttv, a.msf_bips);
            a.coa = from_bips(a.ttv, a.coa_bips);
            a.rederive_gp();
        }
    }
    next
}

fn churn(state: &AssumptionState) -> AssumptionState {
    let parents = state.parent_totals();
    let mut next = card_mix(state);
    for (row, parent_ttv) in next.rows.iter_mut().zip(parents) {
        let a = &mut row.assumption;
        a.ttv *= CHURN_RETENTION;
        a.msf *= CHURN_RETENTION;
        a.coa *= CHURN_RETENTION;
        a.gp = a.msf.saturating_sub(a.coa);
        a.rederive_ratios(parent_ttv);
    }
    next
}

/// Apply one preset and wrap the resulting state in the standard envelope.
pub fn apply_scenario(input: &ScenarioInput) -> CardMixResult<ComputationOutput<AssumptionState>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.state.rows.is_empty() {
        warnings.push(format!("{}: no card-type rows to adjust", input.scenario));
    }

    let next = input.scenario.apply(&input.state);
    log::info!("applied {}", input.scenario);

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        input.scenario.description(),
        &serde_json::json!({
            "scenario": input.scenario.number(),
            "debit_msf_bips": DEBIT_SURCHARGE_BAN_MSF_BIPS.to_string(),
            "churn_retention": CHURN_RETENTION.to_string(),
        }),
        warnings,
        elapsed,
        next,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{MerchantScope, RowKey};
    use crate::assumptions::ValueSet;
    use crate::taxonomy::CardType;
    use crate::types::to_bips;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn row(ct: CardType, ttv: Decimal, msf: Decimal, coa: Decimal, parent: Decimal) -> AssumptionRow {
        let mut v = ValueSet {
            ttv,
            msf,
            coa,
            gp: msf - coa,
            ..ValueSet::default()
        };
        v.rederive_ratios(parent);
        AssumptionRow {
            key: RowKey::new("Bepoz", MerchantScope::All, ct),
            base: v,
            assumption: v,
        }
    }

    /// EFTPOS 600k, Dom.DR 1M, Dom.CR 400k: group base TTV 2M.
    fn state() -> AssumptionState {
        let parent = dec!(2_000_000);
        AssumptionState {
            rows: vec![
                row(CardType::Eftpos, dec!(600_000), dec!(3000), dec!(1200), parent),
                row(CardType::DomesticDebit, dec!(1_000_000), dec!(8000), dec!(3000), parent),
                row(CardType::DomesticCredit, dec!(400_000), dec!(4800), dec!(2400), parent),
            ],
        }
    }

    fn assumption(s: &AssumptionState, ct: CardType) -> ValueSet {
        s.rows.iter().find(|r| r.key.card_type == ct).unwrap().assumption
    }

    #[test]
    fn test_surcharge_ban_prices_debit_at_65_bips() {
        let next = ScenarioPreset::SurchargeBan.apply(&state());
        let dom_dr = assumption(&next, CardType::DomesticDebit);
        assert_eq!(dom_dr.msf, dec!(6500));
        assert_eq!(dom_dr.gp, dec!(3500));
        // Credit untouched
        assert_eq!(assumption(&next, CardType::DomesticCredit).msf, dec!(4800));
    }

    #[test]
    fn test_credit_increase_builds_on_surcharge_ban() {
        let next = ScenarioPreset::CreditIncrease.apply(&state());
        assert_eq!(assumption(&next, CardType::Eftpos).msf_bips, dec!(65));
        let dom_cr = assumption(&next, CardType::DomesticCredit);
        assert_eq!(dom_cr.msf_bips, dec!(160));
        assert_eq!(dom_cr.msf, dec!(6400));
    }

    #[test]
    fn test_reduce_credit_coa() {
        let next = ScenarioPreset::ReduceCreditCoa.apply(&state());
        let dom_cr = assumption(&next, CardType::DomesticCredit);
        // 60 bips - 10
        assert_eq!(dom_cr.coa_bips, dec!(50));
        assert_eq!(dom_cr.coa, dec!(2000));
        assert_eq!(dom_cr.msf, dec!(6400));
        // Debit rates are not part of this preset
        assert_eq!(assumption(&next, CardType::DomesticDebit).msf_bips, dec!(80));
    }

    #[test]
    fn test_reduce_credit_coa_uses_assumption_ttv() {
        let mixed = ScenarioPreset::CardMix.apply(&state());
        let next = ScenarioPreset::ReduceCreditCoa.apply(&mixed);
        let dom_cr = assumption(&next, CardType::DomesticCredit);
        // Card mix sets Dom.CR to 4% of 2M
        assert_eq!(dom_cr.ttv, dec!(80_000));
        assert_eq!(dom_cr.coa, dec!(400));
        // MSF priced on base TTV
        assert_eq!(dom_cr.msf, dec!(6400));
    }

    #[test]
    fn test_card_mix_rescales_ttv_and_dollars() {
        let next = ScenarioPreset::CardMix.apply(&state());
        let eftpos = assumption(&next, CardType::Eftpos);
        assert_eq!(eftpos.pct_of_parent, dec!(40));
        assert_eq!(eftpos.ttv, dec!(800_000));
        // 50 bips on the new TTV
        assert_eq!(eftpos.msf, dec!(4000));
        assert_eq!(eftpos.gp, eftpos.msf - eftpos.coa);
    }

    #[test]
    fn test_churn_shrinks_card_mix_by_fifteen_percent() {
        let next = ScenarioPreset::Churn.apply(&state());
        let eftpos = assumption(&next, CardType::Eftpos);
        assert_eq!(eftpos.ttv, dec!(680_000));
        assert_eq!(eftpos.pct_of_parent, dec!(34));
        assert_eq!(eftpos.msf, dec!(3400));
        assert_eq!(eftpos.gp, eftpos.msf - eftpos.coa);
        assert_eq!(eftpos.msf_bips, to_bips(eftpos.msf, eftpos.ttv));
    }

    #[test]
    fn test_gp_identity_after_every_preset() {
        let s = state();
        for preset in ScenarioPreset::ALL {
            let next = preset.apply(&s);
            for r in &next.rows {
                assert_eq!(r.assumption.gp, r.assumption.msf - r.assumption.coa, "{preset}");
                assert_eq!(r.base, s.row(&r.key).unwrap().base, "{preset} changed base");
            }
        }
    }

    #[test]
    fn test_presets_saturate_on_extreme_loaded_rates() {
        let mut s = state();
        let dom_cr = &mut s.rows[2].assumption;
        dom_cr.coa_bips = Decimal::MIN;
        dom_cr.msf_bips = Decimal::MAX;
        for preset in ScenarioPreset::ALL {
            let next = preset.apply(&s);
            assert_eq!(next.rows.len(), 3, "{preset}");
        }
        let next = ScenarioPreset::ReduceCreditCoa.apply(&s);
        let a = assumption(&next, CardType::DomesticCredit);
        assert_eq!(a.coa, Decimal::MIN);
        assert_eq!(a.gp, Decimal::MAX);
    }

    #[test]
    fn test_parse_presets() {
        assert_eq!("1".parse::<ScenarioPreset>().unwrap(), ScenarioPreset::SurchargeBan);
        assert_eq!("Scenario 5".parse::<ScenarioPreset>().unwrap(), ScenarioPreset::Churn);
        assert_eq!("card_mix".parse::<ScenarioPreset>().unwrap(), ScenarioPreset::CardMix);
        let err = "6".parse::<ScenarioPreset>().unwrap_err();
        assert!(matches!(err, CardMixError::UnknownScenario(_)));

        let p: ScenarioPreset = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(p, ScenarioPreset::ReduceCreditCoa);
        assert!(serde_json::from_str::<ScenarioPreset>("\"bogus\"").is_err());
    }
}
