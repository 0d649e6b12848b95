use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::apportionment::apportion_rows;
use crate::config::ModelConfig;
use crate::source::TransactionRow;
use crate::taxonomy::CardType;
use crate::types::{percent_of, to_bips, with_metadata, Bips, ComputationOutput, MetricSet, Money, Percent};
use crate::CardMixResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Label of the business-unit-wide merchant group.
pub const ALL_MERCHANTS: &str = "All";

/// Label of the hidden per-business-unit reconciliation row.
pub const ADJUSTMENT_MERCHANT: &str = "__ADJUSTMENT__";

/// Merchant level of a grouping: the whole business unit or one merchant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MerchantScope {
    All,
    Named(String),
}

/// Appended to a source merchant whose name collides with a reserved label.
pub const RESERVED_MERCHANT_SUFFIX: &str = " (merchant)";

impl MerchantScope {
    /// Scope of a merchant named in the source. A merchant literally called
    /// "All" or the adjustment label gets [`RESERVED_MERCHANT_SUFFIX`], so
    /// its serialized label never reads back as a different scope.
    pub fn named(name: &str) -> Self {
        if Self::is_reserved(name) {
            MerchantScope::Named(format!("{name}{RESERVED_MERCHANT_SUFFIX}"))
        } else {
            MerchantScope::Named(name.to_string())
        }
    }

    pub fn is_reserved(name: &str) -> bool {
        name == ALL_MERCHANTS || name == ADJUSTMENT_MERCHANT
    }

    pub fn is_all(&self) -> bool {
        matches!(self, MerchantScope::All)
    }

    pub fn label(&self) -> &str {
        match self {
            MerchantScope::All => ALL_MERCHANTS,
            MerchantScope::Named(name) => name,
        }
    }
}

impl From<String> for MerchantScope {
    fn from(s: String) -> Self {
        if s == ALL_MERCHANTS {
            MerchantScope::All
        } else {
            MerchantScope::Named(s)
        }
    }
}

impl From<MerchantScope> for String {
    fn from(scope: MerchantScope) -> Self {
        scope.label().to_string()
    }
}

impl std::fmt::Display for MerchantScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Identity of a card-type row: (business unit, merchant scope, card type).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey {
    pub business_unit: String,
    pub merchant: MerchantScope,
    pub card_type: CardType,
}

impl RowKey {
    pub fn new(business_unit: impl Into<String>, merchant: MerchantScope, card_type: CardType) -> Self {
        RowKey {
            business_unit: business_unit.into(),
            merchant,
            card_type,
        }
    }

    /// True when `other` shares this row's parent group.
    pub fn is_sibling_of(&self, other: &RowKey) -> bool {
        self.business_unit == other.business_unit && self.merchant == other.merchant
    }
}

impl std::fmt::Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {} / {}", self.business_unit, self.merchant, self.card_type)
    }
}

/// One (business unit, merchant scope, card type) aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub key: RowKey,
    pub metrics: MetricSet,
    /// MSF - COA
    pub gp: Money,
    /// TTV / sibling TTV total * 100
    pub pct_of_parent: Percent,
    pub msf_bips: Bips,
    pub coa_bips: Bips,
    pub gp_bips: Bips,
}

/// Negative sum of a business unit's named-merchant rows; cancels the
/// double count when the All group and its merchants are shown together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRow {
    pub business_unit: String,
    pub metrics: MetricSet,
    pub gp: Money,
}

/// Card-type aggregates at business-unit and merchant level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardTypeModel {
    /// Ordered by business unit, All before merchants, merchant, card type
    pub rows: Vec<AggregateRow>,
    pub adjustments: Vec<AdjustmentRow>,
}

impl CardTypeModel {
    pub fn find(&self, key: &RowKey) -> Option<&AggregateRow> {
        self.rows.iter().find(|r| &r.key == key)
    }

    /// Rows sharing one parent group.
    pub fn group<'a>(
        &'a self,
        business_unit: &'a str,
        merchant: &'a MerchantScope,
    ) -> impl Iterator<Item = &'a AggregateRow> + 'a {
        self.rows
            .iter()
            .filter(move |r| r.key.business_unit == business_unit && &r.key.merchant == merchant)
    }

    pub fn parent_ttv(&self, business_unit: &str, merchant: &MerchantScope) -> Money {
        self.group(business_unit, merchant).map(|r| r.metrics.ttv).sum()
    }

    pub fn business_units(&self) -> Vec<&str> {
        let mut units: Vec<&str> = self.rows.iter().map(|r| r.key.business_unit.as_str()).collect();
        units.dedup();
        units
    }

    pub fn adjustment(&self, business_unit: &str) -> Option<&AdjustmentRow> {
        self.adjustments.iter().find(|a| a.business_unit == business_unit)
    }
}

/// Input for building the card-type model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardTypeModelInput {
    pub rows: Vec<TransactionRow>,
    #[serde(default)]
    pub config: ModelConfig,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

fn aggregate_row(key: RowKey, metrics: MetricSet, parent_ttv: Money) -> AggregateRow {
    AggregateRow {
        pct_of_parent: percent_of(metrics.ttv, parent_ttv),
        msf_bips: to_bips(metrics.msf, metrics.ttv),
        coa_bips: to_bips(metrics.coa, metrics.ttv),
        gp_bips: to_bips(metrics.gp(), metrics.ttv),
        gp: metrics.gp(),
        key,
        metrics,
    }
}

/// Group rows into the card-type model.
///
/// The All group combines every non-Wpay acquirer by classified card type
/// with the Wpay totals apportioned by market weight. Named merchants use
/// the row-level classification only. Card types with no positive TTV and
/// the `Other` bucket are left out of the table.
pub fn aggregate_card_types<'a, I>(rows: I) -> (CardTypeModel, Vec<String>)
where
    I: IntoIterator<Item = &'a TransactionRow>,
{
    let mut warnings: Vec<String> = Vec::new();
    let mut sums: BTreeMap<RowKey, MetricSet> = BTreeMap::new();
    let mut wpay_by_bu: BTreeMap<String, Vec<&TransactionRow>> = BTreeMap::new();
    let mut other_ttv = Decimal::ZERO;
    let mut relabelled: BTreeSet<String> = BTreeSet::new();

    for row in rows {
        let bu = row.business_unit();
        let card_type = row.card_type();
        let m = row.metrics();

        if row.acquirer().is_wpay() {
            wpay_by_bu.entry(bu.clone()).or_default().push(row);
        } else {
            if !card_type.is_modelled() {
                other_ttv += m.ttv;
            }
            *sums
                .entry(RowKey::new(bu.clone(), MerchantScope::All, card_type))
                .or_default() += m;
        }

        if let Some(name) = row.merchant_name() {
            if MerchantScope::is_reserved(name) {
                relabelled.insert(name.to_string());
            }
            *sums
                .entry(RowKey::new(bu, MerchantScope::named(name), card_type))
                .or_default() += m;
        }
    }

    for name in relabelled {
        log::warn!("merchant '{name}' collides with a reserved label");
        warnings.push(format!("Merchant '{name}' is shown as '{name}{RESERVED_MERCHANT_SUFFIX}'"));
    }

    for (bu, wpay_rows) in &wpay_by_bu {
        let breakdown = apportion_rows(wpay_rows.iter().copied());
        let dropped = breakdown.unapportioned();
        if !dropped.is_empty() {
            log::warn!("{bu}: Wpay TTV remainder {} not positive", breakdown.remainder.ttv);
            let measures: Vec<String> = dropped
                .iter()
                .map(|(name, value)| format!("{name} {value}"))
                .collect();
            warnings.push(format!(
                "{bu}: Wpay AMEX/EFTPOS reach the Wpay TTV total; remainder not apportioned ({})",
                measures.join(", ")
            ));
        }
        for card_type in CardType::MODELLED {
            *sums
                .entry(RowKey::new(bu.clone(), MerchantScope::All, card_type))
                .or_default() += breakdown.get(card_type);
        }
    }

    if other_ttv > Decimal::ZERO {
        log::warn!("dropping {other_ttv} TTV with unmapped payment-method variants");
        warnings.push(format!(
            "TTV of {other_ttv} classified as Other is excluded from the card-type table"
        ));
    }

    let kept: Vec<(RowKey, MetricSet)> = sums
        .into_iter()
        .filter(|(key, m)| key.card_type.is_modelled() && m.ttv > Decimal::ZERO)
        .collect();

    let mut parent_totals: BTreeMap<(String, MerchantScope), Money> = BTreeMap::new();
    for (key, m) in &kept {
        *parent_totals
            .entry((key.business_unit.clone(), key.merchant.clone()))
            .or_default() += m.ttv;
    }

    let mut merchant_sums: BTreeMap<String, MetricSet> = BTreeMap::new();
    let mut out_rows = Vec::with_capacity(kept.len());
    for (key, m) in kept {
        if !key.merchant.is_all() {
            *merchant_sums.entry(key.business_unit.clone()).or_default() += m;
        }
        let parent = parent_totals
            .get(&(key.business_unit.clone(), key.merchant.clone()))
            .copied()
            .unwrap_or_default();
        out_rows.push(aggregate_row(key, m, parent));
    }

    let adjustments = merchant_sums
        .into_iter()
        .map(|(business_unit, m)| {
            let metrics = -m;
            AdjustmentRow {
                business_unit,
                gp: metrics.gp(),
                metrics,
            }
        })
        .collect();

    log::debug!("aggregated {} card-type rows", out_rows.len());

    (
        CardTypeModel {
            rows: out_rows,
            adjustments,
        },
        warnings,
    )
}

/// Filter the input rows and build the card-type model.
pub fn build_card_type_model(
    input: &CardTypeModelInput,
) -> CardMixResult<ComputationOutput<CardTypeModel>> {
    let start = Instant::now();

    let filtered = input.config.filters.apply(&input.rows);
    let (model, mut warnings) = aggregate_card_types(filtered.iter().copied());
    if model.rows.is_empty() {
        warnings.push("No card-type rows with positive TTV for the selected filters".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Card-type aggregation with Wpay apportionment and merchant reconciliation",
        &serde_json::json!({
            "input_rows": input.rows.len(),
            "filtered_rows": filtered.len(),
            "filter": input.config.filters.cache_key(),
        }),
        warnings,
        elapsed,
        model,
    ))
}
