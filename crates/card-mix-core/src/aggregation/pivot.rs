use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Instant;

use crate::aggregation::card_types::{aggregate_card_types, CardTypeModel};
use crate::config::ModelConfig;
use crate::error::CardMixError;
use crate::source::TransactionRow;
use crate::taxonomy::{compare_business_units, CardType};
use crate::types::{percent_of, with_metadata, ComputationOutput, Money, Percent};
use crate::CardMixResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Measure shown in the pivot cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotMetric {
    #[default]
    Ttv,
    Msf,
    Coa,
    Gp,
    Surcharge,
}

impl PivotMetric {
    pub fn label(&self) -> &'static str {
        match self {
            PivotMetric::Ttv => "TTV",
            PivotMetric::Msf => "MSF",
            PivotMetric::Coa => "COA",
            PivotMetric::Gp => "GP",
            PivotMetric::Surcharge => "SURCHARGE",
        }
    }
}

impl FromStr for PivotMetric {
    type Err = CardMixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ttv" => Ok(PivotMetric::Ttv),
            "msf" => Ok(PivotMetric::Msf),
            "coa" | "acquirer_fee" => Ok(PivotMetric::Coa),
            "gp" => Ok(PivotMetric::Gp),
            "surcharge" | "surcharge_amount" => Ok(PivotMetric::Surcharge),
            other => Err(CardMixError::InvalidInput {
                field: "metric".into(),
                reason: format!("unknown pivot metric '{other}' (expected ttv, msf, coa, gp or surcharge)"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRow {
    pub business_unit: String,
    /// One cell per modelled card type, zero where the unit has none
    pub values: BTreeMap<CardType, Money>,
    pub row_total: Money,
    /// Each cell as a percentage of `row_total`
    pub share_of_row: BTreeMap<CardType, Percent>,
    /// `row_total` as a percentage of the grand total
    pub share_of_grand_total: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardTypePivot {
    pub metric: PivotMetric,
    pub rows: Vec<PivotRow>,
    pub total: PivotRow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotInput {
    pub rows: Vec<TransactionRow>,
    #[serde(default)]
    pub metric: PivotMetric,
    #[serde(default)]
    pub config: ModelConfig,
}

// ---------------------------------------------------------------------------
// Pivot
// ---------------------------------------------------------------------------

fn pivot_row(business_unit: String, values: BTreeMap<CardType, Money>, grand_total: Money) -> PivotRow {
    let row_total: Money = values.values().copied().sum();
    let share_of_row = values
        .iter()
        .map(|(ct, v)| (*ct, percent_of(*v, row_total)))
        .collect();
    PivotRow {
        business_unit,
        share_of_grand_total: percent_of(row_total, grand_total),
        values,
        row_total,
        share_of_row,
    }
}

/// Business unit by card type for one metric, read from the All-merchant
/// rows of a card-type model.
pub fn pivot_model(model: &CardTypeModel, metric: PivotMetric) -> CardTypePivot {
    let mut cells: BTreeMap<String, BTreeMap<CardType, Money>> = BTreeMap::new();
    for row in model.rows.iter().filter(|r| r.key.merchant.is_all()) {
        let value = match metric {
            PivotMetric::Ttv => row.metrics.ttv,
            PivotMetric::Msf => row.metrics.msf,
            PivotMetric::Coa => row.metrics.coa,
            PivotMetric::Gp => row.gp,
            PivotMetric::Surcharge => row.metrics.surcharge,
        };
        let bu_cells = cells
            .entry(row.key.business_unit.clone())
            .or_insert_with(|| CardType::MODELLED.iter().map(|ct| (*ct, Decimal::ZERO)).collect());
        *bu_cells.entry(row.key.card_type).or_default() += value;
    }

    let grand_total: Money = cells.values().flat_map(|c| c.values()).copied().sum();

    let mut column_totals: BTreeMap<CardType, Money> =
        CardType::MODELLED.iter().map(|ct| (*ct, Decimal::ZERO)).collect();
    for bu_cells in cells.values() {
        for (ct, v) in bu_cells {
            *column_totals.entry(*ct).or_default() += *v;
        }
    }

    let mut rows: Vec<PivotRow> = cells
        .into_iter()
        .map(|(bu, values)| pivot_row(bu, values, grand_total))
        .collect();
    rows.sort_by(|a, b| compare_business_units(&a.business_unit, &b.business_unit));

    CardTypePivot {
        metric,
        rows,
        total: pivot_row("Total".to_string(), column_totals, grand_total),
    }
}

/// Aggregate raw rows, then pivot them.
pub fn pivot_by_card_type<'a, I>(rows: I, metric: PivotMetric) -> CardTypePivot
where
    I: IntoIterator<Item = &'a TransactionRow>,
{
    let (model, _) = aggregate_card_types(rows);
    pivot_model(&model, metric)
}

pub fn analyze_pivot(input: &PivotInput) -> CardMixResult<ComputationOutput<CardTypePivot>> {
    let start = Instant::now();

    let filtered = input.config.filters.apply(&input.rows);
    let (model, mut warnings) = aggregate_card_types(filtered.iter().copied());
    let pivot = pivot_model(&model, input.metric);
    if pivot.rows.is_empty() {
        warnings.push("No card-type rows for the selected filters".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        &format!("{} by business unit and card type", input.metric.label()),
        &serde_json::json!({
            "metric": input.metric,
            "filter": input.config.filters.cache_key(),
        }),
        warnings,
        elapsed,
        pivot,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tx(bu: &str, variant: &str, ttv: Decimal) -> TransactionRow {
        TransactionRow {
            business_unit_raw: bu.into(),
            payment_method_variant: variant.into(),
            payment_method: String::new(),
            acquirer: "adyen_managed".into(),
            trading_month: "2025-02".into(),
            merchant: None,
            merchant_account: None,
            account_manager: None,
            ttv,
            msf: ttv / dec!(100),
            coa: Decimal::ZERO,
            surcharge: Decimal::ZERO,
        }
    }

    #[test]
    fn test_pivot_rows_follow_display_order() {
        let rows = vec![
            tx("Other", "visa", dec!(100)),
            tx("SwiftPOS", "visa", dec!(100)),
            tx("Bepoz", "amex", dec!(200)),
        ];
        let pivot = pivot_by_card_type(&rows, PivotMetric::Ttv);
        let order: Vec<&str> = pivot.rows.iter().map(|r| r.business_unit.as_str()).collect();
        assert_eq!(order, vec!["Bepoz", "SwiftPOS", "Other"]);
    }

    #[test]
    fn test_pivot_shares() {
        let rows = vec![
            tx("Bepoz", "visa", dec!(300)),
            tx("Bepoz", "amex", dec!(100)),
            tx("IdealPOS", "visa", dec!(600)),
        ];
        let pivot = pivot_by_card_type(&rows, PivotMetric::Msf);
        let bepoz = &pivot.rows[0];
        assert_eq!(bepoz.row_total, dec!(4));
        assert_eq!(bepoz.share_of_row[&CardType::DomesticCredit], dec!(75));
        assert_eq!(bepoz.share_of_row[&CardType::Eftpos], Decimal::ZERO);
        assert_eq!(bepoz.share_of_grand_total, dec!(40));
        assert_eq!(pivot.total.values[&CardType::DomesticCredit], dec!(9));
        assert_eq!(pivot.total.share_of_grand_total, dec!(100));
        assert!(!pivot.total.values.contains_key(&CardType::Other));
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!("GP".parse::<PivotMetric>().unwrap(), PivotMetric::Gp);
        assert!("margin".parse::<PivotMetric>().is_err());
    }
}
