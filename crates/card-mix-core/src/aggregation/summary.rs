use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::config::ModelConfig;
use crate::source::TransactionRow;
use crate::taxonomy::GST_DIVISOR;
use crate::types::{percent_of, with_metadata, ComputationOutput, MetricSet, Money, Percent};
use crate::CardMixResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOptions {
    /// Divide MSF, COA and GP by 1.1
    #[serde(default)]
    pub ex_gst: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessUnitSummaryRow {
    pub business_unit: String,
    pub ttv: Money,
    pub msf: Money,
    pub coa: Money,
    pub gp: Money,
    pub surcharge: Money,
    pub ttv_pct: Percent,
    pub msf_pct: Percent,
    pub coa_pct: Percent,
    pub gp_pct: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessUnitSummary {
    pub rows: Vec<BusinessUnitSummaryRow>,
    /// Labelled "Total"; every percentage is 100 unless its measure is zero
    pub total: BusinessUnitSummaryRow,
    pub ex_gst: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryInput {
    pub rows: Vec<TransactionRow>,
    #[serde(default)]
    pub config: ModelConfig,
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

fn summary_row(business_unit: String, m: MetricSet, gp: Money, totals: (MetricSet, Money)) -> BusinessUnitSummaryRow {
    let (t, total_gp) = totals;
    BusinessUnitSummaryRow {
        business_unit,
        ttv: m.ttv,
        msf: m.msf,
        coa: m.coa,
        gp,
        surcharge: m.surcharge,
        ttv_pct: percent_of(m.ttv, t.ttv),
        msf_pct: percent_of(m.msf, t.msf),
        coa_pct: percent_of(m.coa, t.coa),
        gp_pct: percent_of(gp, total_gp),
    }
}

/// Per-business-unit totals of absolute values, with each unit's share of
/// the overall totals. Rows are ordered by business-unit name.
pub fn summarize_business_units<'a, I>(rows: I, options: SummaryOptions) -> BusinessUnitSummary
where
    I: IntoIterator<Item = &'a TransactionRow>,
{
    let mut by_bu: BTreeMap<String, MetricSet> = BTreeMap::new();
    for row in rows {
        *by_bu.entry(row.business_unit()).or_default() += row.metrics().abs();
    }

    let fee_divisor = if options.ex_gst { GST_DIVISOR } else { Decimal::ONE };
    let scaled: Vec<(String, MetricSet, Money)> = by_bu
        .into_iter()
        .map(|(bu, m)| {
            let m = MetricSet {
                msf: m.msf / fee_divisor,
                coa: m.coa / fee_divisor,
                ..m
            };
            let gp = m.gp();
            (bu, m, gp)
        })
        .collect();

    let total_metrics: MetricSet = scaled.iter().map(|(_, m, _)| *m).sum();
    let total_gp: Money = scaled.iter().map(|(_, _, gp)| *gp).sum();
    let totals = (total_metrics, total_gp);

    let rows = scaled
        .into_iter()
        .map(|(bu, m, gp)| summary_row(bu, m, gp, totals))
        .collect();

    BusinessUnitSummary {
        rows,
        total: summary_row("Total".to_string(), total_metrics, total_gp, totals),
        ex_gst: options.ex_gst,
    }
}

pub fn analyze_business_units(input: &SummaryInput) -> CardMixResult<ComputationOutput<BusinessUnitSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let filtered = input.config.filters.apply(&input.rows);
    let options = SummaryOptions {
        ex_gst: input.config.ex_gst,
    };
    let summary = summarize_business_units(filtered.iter().copied(), options);

    if summary.rows.is_empty() {
        warnings.push("No rows for the selected filters".into());
    }
    if summary.total.gp < Decimal::ZERO {
        warnings.push(format!("Gross profit is negative overall ({})", summary.total.gp));
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Business-unit summary of absolute TTV, MSF, COA and GP",
        &serde_json::json!({
            "ex_gst": options.ex_gst,
            "gst_divisor": GST_DIVISOR.to_string(),
            "filter": input.config.filters.cache_key(),
        }),
        warnings,
        elapsed,
        summary,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tx(bu: &str, ttv: Decimal, msf: Decimal, coa: Decimal) -> TransactionRow {
        TransactionRow {
            business_unit_raw: bu.into(),
            payment_method_variant: "visa".into(),
            payment_method: "VISA".into(),
            acquirer: "adyen_managed".into(),
            trading_month: "2025-02".into(),
            merchant: None,
            merchant_account: None,
            account_manager: None,
            ttv,
            msf,
            coa,
            surcharge: Decimal::ZERO,
        }
    }

    #[test]
    fn test_summary_uses_absolute_values_and_shares() {
        let rows = vec![
            tx("Bepoz", dec!(300), dec!(6), dec!(2)),
            tx("Bepoz", dec!(-100), dec!(-2), dec!(-2)),
            tx("OolioPay", dec!(600), dec!(12), dec!(4)),
        ];
        let s = summarize_business_units(&rows, SummaryOptions::default());

        assert_eq!(s.rows.len(), 2);
        let bepoz = &s.rows[0];
        assert_eq!(bepoz.business_unit, "Bepoz");
        assert_eq!(bepoz.ttv, dec!(400));
        assert_eq!(bepoz.gp, dec!(4));
        assert_eq!(bepoz.ttv_pct, dec!(40));
        assert_eq!(s.rows[1].business_unit, "Oolio Pay");
        assert_eq!(s.total.ttv, dec!(1000));
        assert_eq!(s.total.ttv_pct, dec!(100));
    }

    #[test]
    fn test_ex_gst_divides_fee_measures_only() {
        let rows = vec![tx("Bepoz", dec!(1000), dec!(11), dec!(5.5))];
        let s = summarize_business_units(&rows, SummaryOptions { ex_gst: true });
        assert_eq!(s.total.ttv, dec!(1000));
        assert_eq!(s.total.msf, dec!(10));
        assert_eq!(s.total.coa, dec!(5));
        assert_eq!(s.total.gp, dec!(5));
        assert!(s.ex_gst);
    }

    #[test]
    fn test_empty_input_yields_zero_total() {
        let s = summarize_business_units(std::iter::empty::<&TransactionRow>(), SummaryOptions::default());
        assert!(s.rows.is_empty());
        assert_eq!(s.total.ttv_pct, Decimal::ZERO);
    }
}
