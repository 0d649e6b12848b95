use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::source::TransactionRow;
use crate::taxonomy::{CardType, WPAY_REMAINDER_WEIGHTS};
use crate::types::{with_metadata, ComputationOutput, MetricSet, Money};
use crate::CardMixResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for apportioning one (business unit, [merchant]) Wpay group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WpayInput {
    /// Wpay aggregate across every card for the group
    pub total: MetricSet,
    /// Directly reported AMEX sub-total
    #[serde(default)]
    pub amex: MetricSet,
    /// Directly reported EFTPOS sub-total
    #[serde(default)]
    pub eftpos: MetricSet,
}

/// Wpay values spread across the eight modelled card types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WpayBreakdown {
    /// total - AMEX - EFTPOS, before the positive-TTV gate
    pub remainder: MetricSet,
    pub by_card_type: BTreeMap<CardType, MetricSet>,
}

impl WpayBreakdown {
    pub fn get(&self, card_type: CardType) -> MetricSet {
        self.by_card_type
            .get(&card_type)
            .copied()
            .unwrap_or(MetricSet::ZERO)
    }

    /// Sum over all card types.
    pub fn total(&self) -> MetricSet {
        self.by_card_type.values().copied().sum()
    }

    /// Non-zero remainder measures left out because the TTV remainder was
    /// not positive.
    pub fn unapportioned(&self) -> Vec<(&'static str, Money)> {
        let r = self.remainder;
        if r.ttv > Decimal::ZERO {
            return Vec::new();
        }
        [
            ("TTV", r.ttv),
            ("MSF", r.msf),
            ("COA", r.coa),
            ("SURCHARGE", r.surcharge),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_zero())
        .collect()
    }
}

// ---------------------------------------------------------------------------
// Apportionment
// ---------------------------------------------------------------------------

fn split_by_weight(value: Money) -> [(CardType, Money); 6] {
    let weight_sum: Decimal = WPAY_REMAINDER_WEIGHTS.iter().map(|(_, w)| *w).sum();
    WPAY_REMAINDER_WEIGHTS.map(|(card_type, weight)| {
        let share = if weight_sum.is_zero() {
            Decimal::ZERO
        } else {
            value
                .checked_mul(weight)
                .map_or_else(|| value / weight_sum * weight, |v| v / weight_sum)
        };
        (card_type, share)
    })
}

/// Split a single remainder across the six weighted card types. A remainder
/// of zero or less apportions nothing.
pub fn apportion_remainder(remainder: Money) -> [(CardType, Money); 6] {
    if remainder > Decimal::ZERO {
        split_by_weight(remainder)
    } else {
        WPAY_REMAINDER_WEIGHTS.map(|(card_type, _)| (card_type, Decimal::ZERO))
    }
}

/// Apportion a remainder by the TTV split.
///
/// The TTV remainder decides whether anything is apportioned. When it is
/// positive every measure is split by the same weights, keeping its sign, so
/// a negative MSF or COA remainder (refunds, fee credits) lands on the
/// weighted card types rather than vanishing. When it is zero or negative
/// nothing is apportioned; see [`WpayBreakdown::unapportioned`].
pub fn apportion_metrics(remainder: MetricSet) -> Vec<(CardType, MetricSet)> {
    if remainder.ttv <= Decimal::ZERO {
        return WPAY_REMAINDER_WEIGHTS
            .iter()
            .map(|(card_type, _)| (*card_type, MetricSet::ZERO))
            .collect();
    }
    let ttv = split_by_weight(remainder.ttv);
    let msf = split_by_weight(remainder.msf);
    let coa = split_by_weight(remainder.coa);
    let surcharge = split_by_weight(remainder.surcharge);

    (0..WPAY_REMAINDER_WEIGHTS.len())
        .map(|i| {
            (
                ttv[i].0,
                MetricSet::new(ttv[i].1, msf[i].1, coa[i].1, surcharge[i].1),
            )
        })
        .collect()
}

/// AMEX and EFTPOS pass through; the remainder is apportioned by weight.
pub fn apportion_wpay(total: MetricSet, amex: MetricSet, eftpos: MetricSet) -> WpayBreakdown {
    let remainder = total - amex - eftpos;
    let mut by_card_type = BTreeMap::new();
    by_card_type.insert(CardType::Amex, amex);
    by_card_type.insert(CardType::Eftpos, eftpos);
    for (card_type, share) in apportion_metrics(remainder) {
        by_card_type.insert(card_type, share);
    }
    WpayBreakdown {
        remainder,
        by_card_type,
    }
}

/// Apportion a group of Wpay rows, reading the AMEX/EFTPOS sub-totals from
/// each row's coarse payment method.
pub fn apportion_rows<'a, I>(rows: I) -> WpayBreakdown
where
    I: IntoIterator<Item = &'a TransactionRow>,
{
    let mut total = MetricSet::ZERO;
    let mut amex = MetricSet::ZERO;
    let mut eftpos = MetricSet::ZERO;
    for row in rows {
        let m = row.metrics();
        total += m;
        match row.wpay_direct_card_type() {
            Some(CardType::Amex) => amex += m,
            Some(CardType::Eftpos) => eftpos += m,
            _ => {}
        }
    }
    apportion_wpay(total, amex, eftpos)
}

/// Apportion one Wpay group and wrap the result in the standard envelope.
pub fn analyze_wpay(input: &WpayInput) -> CardMixResult<ComputationOutput<WpayBreakdown>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let breakdown = apportion_wpay(input.total, input.amex, input.eftpos);

    for (name, value) in breakdown.unapportioned() {
        warnings.push(format!(
            "Wpay {name} remainder of {value} not apportioned: TTV remainder is not positive"
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Wpay card-type apportionment by fixed market weights",
        &serde_json::json!({
            "weights": WPAY_REMAINDER_WEIGHTS
                .iter()
                .map(|(ct, w)| (ct.label(), w.to_string()))
                .collect::<BTreeMap<_, _>>(),
            "direct_card_types": ["AMEX", "EFTPOS"],
        }),
        warnings,
        elapsed,
        breakdown,
    ))
}
