use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::config::ModelConfig;
use crate::source::TransactionRow;
use crate::types::{with_metadata, ComputationOutput, MetricSet, Money};
use crate::CardMixResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Merchant incentives for one trading month, as exported from the CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncentiveRecord {
    #[serde(alias = "MERCHANT_ID", alias = "merchant_id", alias = "MERCHANT_ACCOUNT")]
    pub merchant_account: String,
    #[serde(alias = "TRADING_MONTH")]
    pub trading_month: String,
    #[serde(alias = "ADV_PLUS_SUBSIDY_DISCOUNT", default, deserialize_with = "zero_if_null")]
    pub adv_plus_subsidy: Money,
    #[serde(alias = "SAAS_SUBSIDY_DISCOUNT", default, deserialize_with = "zero_if_null")]
    pub saas_subsidy: Money,
    #[serde(alias = "TERMINAL_SUBSIDY_DISCOUNT", default, deserialize_with = "zero_if_null")]
    pub terminal_subsidy: Money,
}

impl IncentiveRecord {
    pub fn total(&self) -> Money {
        self.adv_plus_subsidy + self.saas_subsidy + self.terminal_subsidy
    }
}

fn zero_if_null<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Decimal>::deserialize(deserializer)?.unwrap_or(Decimal::ZERO))
}

/// One merchant account in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantIncentiveRow {
    pub business_unit: String,
    pub merchant: String,
    pub merchant_account: String,
    pub trading_month: String,
    pub ttv: Money,
    pub msf: Money,
    pub coa: Money,
    pub gp_before_incentives: Money,
    pub incentives: Money,
    pub gp_after_incentives: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessUnitIncentiveRow {
    pub business_unit: String,
    pub ttv: Money,
    pub gp_before_incentives: Money,
    pub incentives: Money,
    pub gp_after_incentives: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncentiveReport {
    pub merchants: Vec<MerchantIncentiveRow>,
    pub business_units: Vec<BusinessUnitIncentiveRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncentiveInput {
    pub rows: Vec<TransactionRow>,
    #[serde(default)]
    pub incentives: Vec<IncentiveRecord>,
    #[serde(default)]
    pub config: ModelConfig,
}

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

type MerchantKey = (String, String, String, String);

/// Merchant-level GP with incentives netted off, plus a business-unit
/// rollup. Incentives are joined once per (account, month) group, so
/// several transaction rows never multiply one incentive.
pub fn merchant_gp_after_incentives<'a, I>(
    rows: I,
    incentives: &[IncentiveRecord],
) -> (IncentiveReport, Vec<String>)
where
    I: IntoIterator<Item = &'a TransactionRow>,
{
    let mut warnings: Vec<String> = Vec::new();

    let mut by_account: BTreeMap<(String, String), Money> = BTreeMap::new();
    for rec in incentives {
        *by_account
            .entry((rec.merchant_account.trim().to_string(), rec.trading_month.trim().to_string()))
            .or_default() += rec.total();
    }

    let mut groups: BTreeMap<MerchantKey, MetricSet> = BTreeMap::new();
    for row in rows {
        let key = (
            row.business_unit(),
            row.merchant_name().unwrap_or("Unknown").to_string(),
            row.merchant_account.as_deref().unwrap_or("").trim().to_string(),
            row.trading_month.trim().to_string(),
        );
        *groups.entry(key).or_default() += row.metrics();
    }

    let mut matched = 0usize;
    let merchants: Vec<MerchantIncentiveRow> = groups
        .into_iter()
        .map(|((business_unit, merchant, merchant_account, trading_month), m)| {
            let incentives = by_account
                .get(&(merchant_account.clone(), trading_month.clone()))
                .copied()
                .unwrap_or(Decimal::ZERO);
            if !incentives.is_zero() {
                matched += 1;
            }
            MerchantIncentiveRow {
                business_unit,
                merchant,
                merchant_account,
                trading_month,
                ttv: m.ttv,
                msf: m.msf,
                coa: m.coa,
                gp_before_incentives: m.gp(),
                incentives,
                gp_after_incentives: m.gp() - incentives,
            }
        })
        .collect();

    let with_value = by_account.values().filter(|v| !v.is_zero()).count();
    if matched < with_value {
        warnings.push(format!(
            "{} incentive account-months have no matching transactions",
            with_value - matched
        ));
    }

    let mut rollup: BTreeMap<&str, BusinessUnitIncentiveRow> = BTreeMap::new();
    for m in &merchants {
        let bu = rollup
            .entry(m.business_unit.as_str())
            .or_insert_with(|| BusinessUnitIncentiveRow {
                business_unit: m.business_unit.clone(),
                ttv: Decimal::ZERO,
                gp_before_incentives: Decimal::ZERO,
                incentives: Decimal::ZERO,
                gp_after_incentives: Decimal::ZERO,
            });
        bu.ttv += m.ttv;
        bu.gp_before_incentives += m.gp_before_incentives;
        bu.incentives += m.incentives;
        bu.gp_after_incentives += m.gp_after_incentives;
    }

    let business_units = rollup.into_values().collect();
    (
        IncentiveReport {
            merchants,
            business_units,
        },
        warnings,
    )
}

pub fn analyze_incentives(input: &IncentiveInput) -> CardMixResult<ComputationOutput<IncentiveReport>> {
    let start = Instant::now();

    let filtered = input.config.filters.apply(&input.rows);
    let (report, mut warnings) = merchant_gp_after_incentives(filtered.iter().copied(), &input.incentives);

    for bu in report.business_units.iter().filter(|b| b.gp_after_incentives < Decimal::ZERO) {
        warnings.push(format!(
            "{}: incentives exceed gross profit ({})",
            bu.business_unit, bu.gp_after_incentives
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Merchant GP after advance-plus, SaaS and terminal subsidies",
        &serde_json::json!({
            "incentive_records": input.incentives.len(),
            "join": ["merchant_account", "trading_month"],
            "filter": input.config.filters.cache_key(),
        }),
        warnings,
        elapsed,
        report,
    ))
}
