use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::aggregation::{aggregate_card_types, CardTypeModel, ADJUSTMENT_MERCHANT};
use crate::assumptions::{AssumptionRow, AssumptionState, ValueSet};
use crate::config::ModelConfig;
use crate::error::CardMixError;
use crate::source::TransactionRow;
use crate::taxonomy::CardType;
use crate::types::{safe_div, with_metadata, Bips, ComputationOutput, Money, Percent, PERCENT_SCALE};
use crate::CardMixResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One row of the recalculation grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelTableRow {
    #[serde(rename = "Business Unit")]
    pub business_unit: String,
    /// "All", a merchant name or the adjustment marker; absent on the Total row
    #[serde(rename = "Merchant", skip_serializing_if = "Option::is_none", default)]
    pub merchant: Option<String>,
    #[serde(rename = "Card Type", skip_serializing_if = "Option::is_none", default)]
    pub card_type: Option<CardType>,

    #[serde(rename = "TTV")]
    pub ttv: Money,
    #[serde(rename = "%ofTTV")]
    pub ttv_pct: Percent,
    #[serde(rename = "TTV(Assumption)")]
    pub ttv_assumption: Money,
    #[serde(rename = "%ofTTV(Assumption)")]
    pub ttv_pct_assumption: Percent,

    #[serde(rename = "MSF")]
    pub msf: Money,
    #[serde(rename = "MSFBips")]
    pub msf_bips: Bips,
    #[serde(rename = "MSF(Assumption)")]
    pub msf_assumption: Money,
    #[serde(rename = "MSFBips(Assumption)")]
    pub msf_bips_assumption: Bips,

    #[serde(rename = "COA")]
    pub coa: Money,
    #[serde(rename = "COABips")]
    pub coa_bips: Bips,
    #[serde(rename = "COA(Assumption)")]
    pub coa_assumption: Money,
    #[serde(rename = "COABips(Assumption)")]
    pub coa_bips_assumption: Bips,

    #[serde(rename = "GP")]
    pub gp: Money,
    #[serde(rename = "GPBips")]
    pub gp_bips: Bips,
    #[serde(rename = "GP(Assumption)")]
    pub gp_assumption: Money,
    #[serde(rename = "GPBips(Assumption)")]
    pub gp_bips_assumption: Bips,

    #[serde(default)]
    pub hidden: bool,
}

impl ModelTableRow {
    fn base(&self) -> ValueSet {
        ValueSet {
            ttv: self.ttv,
            pct_of_parent: self.ttv_pct,
            msf: self.msf,
            msf_bips: self.msf_bips,
            coa: self.coa,
            coa_bips: self.coa_bips,
            gp: self.gp,
            gp_bips: self.gp_bips,
        }
    }

    fn assumption(&self) -> ValueSet {
        ValueSet {
            ttv: self.ttv_assumption,
            pct_of_parent: self.ttv_pct_assumption,
            msf: self.msf_assumption,
            msf_bips: self.msf_bips_assumption,
            coa: self.coa_assumption,
            coa_bips: self.coa_bips_assumption,
            gp: self.gp_assumption,
            gp_bips: self.gp_bips_assumption,
        }
    }

    fn from_values(
        business_unit: String,
        merchant: Option<String>,
        card_type: Option<CardType>,
        base: ValueSet,
        assumption: ValueSet,
    ) -> Self {
        ModelTableRow {
            business_unit,
            merchant,
            card_type,
            ttv: base.ttv,
            ttv_pct: base.pct_of_parent,
            ttv_assumption: assumption.ttv,
            ttv_pct_assumption: assumption.pct_of_parent,
            msf: base.msf,
            msf_bips: base.msf_bips,
            msf_assumption: assumption.msf,
            msf_bips_assumption: assumption.msf_bips,
            coa: base.coa,
            coa_bips: base.coa_bips,
            coa_assumption: assumption.coa,
            coa_bips_assumption: assumption.coa_bips,
            gp: base.gp,
            gp_bips: base.gp_bips,
            gp_assumption: assumption.gp,
            gp_bips_assumption: assumption.gp_bips,
            hidden: false,
        }
    }

    fn from_assumption_row(row: &AssumptionRow) -> Self {
        Self::from_values(
            row.key.business_unit.clone(),
            Some(row.key.merchant.label().to_string()),
            Some(row.key.card_type),
            row.base,
            row.assumption,
        )
    }

    pub fn is_adjustment(&self) -> bool {
        self.merchant.as_deref() == Some(ADJUSTMENT_MERCHANT)
    }
}

/// Card-type rows, hidden adjustment rows and the Total row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelTable {
    pub rows: Vec<ModelTableRow>,
    pub total: ModelTableRow,
}

/// Presentation row. With `show_bips` the MSF, COA and GP columns carry
/// basis points instead of dollars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    #[serde(rename = "Business Unit")]
    pub business_unit: String,
    #[serde(rename = "Merchant", skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(rename = "Card Type", skip_serializing_if = "Option::is_none")]
    pub card_type: Option<CardType>,
    #[serde(rename = "TTV")]
    pub ttv: Money,
    #[serde(rename = "%ofTTV")]
    pub ttv_pct: Percent,
    #[serde(rename = "TTV(Assumption)")]
    pub ttv_assumption: Money,
    #[serde(rename = "%ofTTV(Assumption)")]
    pub ttv_pct_assumption: Percent,
    #[serde(rename = "MSF")]
    pub msf: Decimal,
    #[serde(rename = "MSF(Assumption)")]
    pub msf_assumption: Decimal,
    #[serde(rename = "COA")]
    pub coa: Decimal,
    #[serde(rename = "COA(Assumption)")]
    pub coa_assumption: Decimal,
    #[serde(rename = "GP")]
    pub gp: Decimal,
    #[serde(rename = "GP(Assumption)")]
    pub gp_assumption: Decimal,
    /// "$" or "bips"
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInput {
    pub rows: Vec<TransactionRow>,
    #[serde(default)]
    pub config: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOutput {
    pub model: CardTypeModel,
    pub state: AssumptionState,
    pub table: ModelTable,
    pub display: Vec<DisplayRow>,
}

// ---------------------------------------------------------------------------
// Table construction
// ---------------------------------------------------------------------------

fn negated_sum<'a>(rows: impl Iterator<Item = &'a AssumptionRow>) -> (ValueSet, ValueSet) {
    let mut base = ValueSet::default();
    let mut assumption = ValueSet::default();
    for r in rows {
        base.ttv -= r.base.ttv;
        base.msf -= r.base.msf;
        base.coa -= r.base.coa;
        base.gp -= r.base.gp;
        assumption.ttv -= r.assumption.ttv;
        assumption.msf -= r.assumption.msf;
        assumption.coa -= r.assumption.coa;
        assumption.gp -= r.assumption.gp;
    }
    (base, assumption)
}

/// Sum of dollar values with TTV-weighted average bips. Percent is 100, or
/// 0 when the summed TTV is 0.
fn weighted_total<'a>(values: impl Iterator<Item = &'a ValueSet> + Clone) -> ValueSet {
    let ttv: Money = values.clone().map(|v| v.ttv).sum();
    let weighted = |f: fn(&ValueSet) -> Decimal| -> Bips {
        safe_div(values.clone().map(|v| f(v) * v.ttv).sum(), ttv)
    };
    ValueSet {
        ttv,
        pct_of_parent: if ttv.is_zero() { Decimal::ZERO } else { PERCENT_SCALE },
        msf: values.clone().map(|v| v.msf).sum(),
        msf_bips: weighted(|v| v.msf_bips),
        coa: values.clone().map(|v| v.coa).sum(),
        coa_bips: weighted(|v| v.coa_bips),
        gp: values.clone().map(|v| v.gp).sum(),
        gp_bips: weighted(|v| v.gp_bips),
    }
}

/// The Total row over the business-unit-wide card-type rows.
pub fn total_row(state: &AssumptionState) -> ModelTableRow {
    let all: Vec<&AssumptionRow> = state.all_merchant_rows().collect();
    let base = weighted_total(all.iter().map(|r| &r.base));
    let assumption = weighted_total(all.iter().map(|r| &r.assumption));
    ModelTableRow::from_values("Total".to_string(), None, None, base, assumption)
}

impl ModelTable {
    /// Lay out a state: each business unit's rows followed by its hidden
    /// adjustment row, then the Total row.
    pub fn from_state(state: &AssumptionState) -> Self {
        let mut by_bu: BTreeMap<&str, Vec<&AssumptionRow>> = BTreeMap::new();
        for row in &state.rows {
            by_bu.entry(row.key.business_unit.as_str()).or_default().push(row);
        }

        let mut rows = Vec::with_capacity(state.rows.len() + by_bu.len());
        for (bu, bu_rows) in by_bu {
            rows.extend(bu_rows.iter().map(|r| ModelTableRow::from_assumption_row(r)));

            let mut named = bu_rows.iter().copied().filter(|r| !r.key.merchant.is_all()).peekable();
            if named.peek().is_some() {
                let (base, assumption) = negated_sum(named);
                let mut adj = ModelTableRow::from_values(
                    bu.to_string(),
                    Some(ADJUSTMENT_MERCHANT.to_string()),
                    None,
                    base,
                    assumption,
                );
                adj.hidden = true;
                rows.push(adj);
            }
        }

        ModelTable {
            rows,
            total: total_row(state),
        }
    }

    /// Visible rows plus the Total row, in dollars or in bips.
    pub fn render(&self, show_bips: bool) -> Vec<DisplayRow> {
        self.rows
            .iter()
            .filter(|r| !r.hidden)
            .chain(std::iter::once(&self.total))
            .map(|r| {
                let (base, assumption) = (r.base(), r.assumption());
                let pick = |dollars: Decimal, bips: Decimal| if show_bips { bips } else { dollars };
                DisplayRow {
                    business_unit: r.business_unit.clone(),
                    merchant: r.merchant.clone(),
                    card_type: r.card_type,
                    ttv: base.ttv,
                    ttv_pct: base.pct_of_parent,
                    ttv_assumption: assumption.ttv,
                    ttv_pct_assumption: assumption.pct_of_parent,
                    msf: pick(base.msf, base.msf_bips),
                    msf_assumption: pick(assumption.msf, assumption.msf_bips),
                    coa: pick(base.coa, base.coa_bips),
                    coa_assumption: pick(assumption.coa, assumption.coa_bips),
                    gp: pick(base.gp, base.gp_bips),
                    gp_assumption: pick(assumption.gp, assumption.gp_bips),
                    unit: if show_bips { "bips" } else { "$" }.to_string(),
                }
            })
            .collect()
    }
}

/// Filter, aggregate and lay out the recalculation grid with assumptions
/// equal to base.
pub fn build_model(input: &ModelInput) -> CardMixResult<ComputationOutput<ModelOutput>> {
    let start = Instant::now();

    if input.rows.is_empty() {
        return Err(CardMixError::InsufficientData(
            "At least one transaction row is required".into(),
        ));
    }

    let filtered = input.config.filters.apply(&input.rows);
    let (model, mut warnings) = aggregate_card_types(filtered.iter().copied());
    if model.rows.is_empty() {
        warnings.push("No card-type rows with positive TTV for the selected filters".into());
    }

    let state = AssumptionState::from_model(&model);
    let table = ModelTable::from_state(&state);
    let display = table.render(input.config.show_bips);
    log::info!(
        "model built: {} rows in, {} card-type rows, {} business units",
        filtered.len(),
        state.rows.len(),
        model.business_units().len()
    );

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Card-type recalculation grid (base = assumption at load)",
        &serde_json::json!({
            "filter": input.config.filters.cache_key(),
            "show_bips": input.config.show_bips,
        }),
        warnings,
        elapsed,
        ModelOutput {
            model,
            state,
            table,
            display,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{MerchantScope, RowKey};
    use crate::assumptions::{edit_rate, RateMetric};
    use rust_decimal_macros::dec;

    fn tx(variant: &str, merchant: &str, ttv: Decimal, msf: Decimal, coa: Decimal) -> TransactionRow {
        TransactionRow {
            business_unit_raw: "Bepoz".into(),
            payment_method_variant: variant.into(),
            payment_method: String::new(),
            acquirer: "adyen_managed".into(),
            trading_month: "2025-02".into(),
            merchant: Some(merchant.into()),
            merchant_account: None,
            account_manager: None,
            ttv,
            msf,
            coa,
            surcharge: Decimal::ZERO,
        }
    }

    fn state() -> AssumptionState {
        let rows = vec![
            tx("visa", "Cafe", dec!(3000), dec!(45), dec!(15)),
            tx("mcdebit", "Bar", dec!(1000), dec!(5), dec!(3)),
        ];
        let (model, _) = aggregate_card_types(&rows);
        AssumptionState::from_model(&model)
    }

    #[test]
    fn test_total_row_weights_bips_by_ttv() {
        let total = total_row(&state());
        assert_eq!(total.ttv, dec!(4000));
        assert_eq!(total.msf, dec!(50));
        // (150 * 3000 + 50 * 1000) / 4000
        assert_eq!(total.msf_bips, dec!(125));
        assert_eq!(total.ttv_pct, dec!(100));
        assert_eq!(total.gp, dec!(32));
    }

    #[test]
    fn test_total_row_zero_ttv() {
        let total = total_row(&AssumptionState::default());
        assert_eq!(total.ttv_pct, Decimal::ZERO);
        assert_eq!(total.msf_bips, Decimal::ZERO);
    }

    #[test]
    fn test_adjustment_row_hidden_and_negated() {
        let table = ModelTable::from_state(&state());
        let adj: Vec<&ModelTableRow> = table.rows.iter().filter(|r| r.is_adjustment()).collect();
        assert_eq!(adj.len(), 1);
        assert!(adj[0].hidden);
        assert_eq!(adj[0].ttv, dec!(-4000));
        assert_eq!(adj[0].gp_assumption, dec!(-32));

        let visible: Money = table.rows.iter().filter(|r| !r.hidden).map(|r| r.ttv).sum();
        assert_eq!(visible + adj[0].ttv, table.total.ttv);
    }

    #[test]
    fn test_render_switches_units() {
        let s = state();
        let key = RowKey::new("Bepoz", MerchantScope::All, CardType::DomesticCredit);
        let s = edit_rate(&s, key, RateMetric::Msf, dec!(160)).unwrap();
        let table = ModelTable::from_state(&s);

        let dollars = table.render(false);
        let bips = table.render(true);
        assert_eq!(dollars.len(), bips.len());
        assert!(dollars.iter().all(|r| r.merchant.as_deref() != Some(ADJUSTMENT_MERCHANT)));
        // Rows are ordered by card type, so Dom.DR precedes Dom.CR
        assert_eq!(dollars[1].card_type, Some(CardType::DomesticCredit));
        assert_eq!(dollars[1].merchant.as_deref(), Some("All"));
        assert_eq!(dollars[1].msf_assumption, dec!(48));
        assert_eq!(bips[1].msf_assumption, dec!(160));
        assert_eq!(bips[1].ttv, dollars[1].ttv);
        assert_eq!(bips.last().unwrap().business_unit, "Total");
    }

    #[test]
    fn test_build_model_requires_rows() {
        let input = ModelInput {
            rows: vec![],
            config: ModelConfig::default(),
        };
        assert!(matches!(build_model(&input), Err(CardMixError::InsufficientData(_))));
    }

    #[test]
    fn test_contract_column_names() {
        let json = serde_json::to_value(&total_row(&state())).unwrap();
        for col in ["Business Unit", "%ofTTV(Assumption)", "MSFBips", "GPBips(Assumption)"] {
            assert!(json.get(col).is_some(), "missing {col}");
        }
    }
}
