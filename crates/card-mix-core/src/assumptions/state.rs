use serde::{Deserialize, Serialize};

use crate::aggregation::{AggregateRow, CardTypeModel, MerchantScope, RowKey};
use crate::types::{checked_to_bips, percent_of, to_bips, Bips, Money, Percent};

/// The eight values the table shows per card-type row, on either side of the
/// base/assumption split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSet {
    pub ttv: Money,
    pub pct_of_parent: Percent,
    pub msf: Money,
    pub msf_bips: Bips,
    pub coa: Money,
    pub coa_bips: Bips,
    pub gp: Money,
    pub gp_bips: Bips,
}

impl ValueSet {
    pub fn from_aggregate(row: &AggregateRow) -> Self {
        ValueSet {
            ttv: row.metrics.ttv,
            pct_of_parent: row.pct_of_parent,
            msf: row.metrics.msf,
            msf_bips: row.msf_bips,
            coa: row.metrics.coa,
            coa_bips: row.coa_bips,
            gp: row.gp,
            gp_bips: row.gp_bips,
        }
    }

    /// GP = MSF - COA, and its bips against this set's TTV.
    pub fn rederive_gp(&mut self) {
        self.gp = self.msf.saturating_sub(self.coa);
        self.gp_bips = to_bips(self.gp, self.ttv);
    }

    /// [`rederive_gp`](Self::rederive_gp) that leaves the set unchanged and
    /// returns `None` when GP or its bips leave the Decimal range.
    pub fn checked_rederive_gp(&mut self) -> Option<()> {
        let gp = self.msf.checked_sub(self.coa)?;
        self.gp_bips = checked_to_bips(gp, self.ttv)?;
        self.gp = gp;
        Some(())
    }

    /// Recompute every bips and the percentage from the dollar values.
    pub fn rederive_ratios(&mut self, parent_ttv: Money) {
        self.pct_of_parent = percent_of(self.ttv, parent_ttv);
        self.msf_bips = to_bips(self.msf, self.ttv);
        self.coa_bips = to_bips(self.coa, self.ttv);
        self.gp_bips = to_bips(self.gp, self.ttv);
    }
}

/// A card-type row with its immutable base values and editable assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionRow {
    pub key: RowKey,
    pub base: ValueSet,
    pub assumption: ValueSet,
}

/// Assumption values for every card-type row of a model. Transitions never
/// mutate in place; each returns a new state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssumptionState {
    pub rows: Vec<AssumptionRow>,
}

impl AssumptionState {
    /// Assumption = base for every card-type row. Adjustment rows are not
    /// editable and are not carried.
    pub fn from_model(model: &CardTypeModel) -> Self {
        let rows = model
            .rows
            .iter()
            .map(|r| {
                let base = ValueSet::from_aggregate(r);
                AssumptionRow {
                    key: r.key.clone(),
                    base,
                    assumption: base,
                }
            })
            .collect();
        AssumptionState { rows }
    }

    pub fn row(&self, key: &RowKey) -> Option<&AssumptionRow> {
        self.rows.iter().find(|r| &r.key == key)
    }

    pub(crate) fn row_mut(&mut self, key: &RowKey) -> Option<&mut AssumptionRow> {
        self.rows.iter_mut().find(|r| &r.key == key)
    }

    pub fn contains(&self, key: &RowKey) -> bool {
        self.row(key).is_some()
    }

    /// Sum of base TTV over the rows sharing `key`'s parent group.
    pub fn parent_base_ttv(&self, key: &RowKey) -> Money {
        self.rows
            .iter()
            .filter(|r| r.key.is_sibling_of(key))
            .map(|r| r.base.ttv)
            .sum()
    }

    /// Base TTV per parent group, keyed like the rows.
    pub(crate) fn parent_totals(&self) -> Vec<Money> {
        self.rows.iter().map(|r| self.parent_base_ttv(&r.key)).collect()
    }

    /// Rows of the business-unit-wide groups.
    pub fn all_merchant_rows(&self) -> impl Iterator<Item = &AssumptionRow> {
        self.rows.iter().filter(|r| r.key.merchant == MerchantScope::All)
    }

    /// Assumption = base for every row.
    pub fn reset(&self) -> AssumptionState {
        AssumptionState {
            rows: self
                .rows
                .iter()
                .map(|r| AssumptionRow {
                    assumption: r.base,
                    ..r.clone()
                })
                .collect(),
        }
    }

    /// True when no assumption differs from its base.
    pub fn is_pristine(&self) -> bool {
        self.rows.iter().all(|r| r.assumption == r.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::aggregate_card_types;
    use crate::source::TransactionRow;
    use crate::taxonomy::CardType;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn rows() -> Vec<TransactionRow> {
        [("visa", dec!(600)), ("mcdebit", dec!(400))]
            .iter()
            .map(|(variant, ttv)| TransactionRow {
                business_unit_raw: "Bepoz".into(),
                payment_method_variant: variant.to_string(),
                payment_method: String::new(),
                acquirer: "adyen_managed".into(),
                trading_month: "2025-02".into(),
                merchant: Some("Cafe".into()),
                merchant_account: None,
                account_manager: None,
                ttv: *ttv,
                msf: *ttv / dec!(100),
                coa: *ttv / dec!(200),
                surcharge: Decimal::ZERO,
            })
            .collect()
    }

    #[test]
    fn test_from_model_starts_pristine() {
        let (model, _) = aggregate_card_types(&rows());
        let state = AssumptionState::from_model(&model);
        // Two card types at All scope and two at merchant scope
        assert_eq!(state.rows.len(), 4);
        assert!(state.is_pristine());
        let key = RowKey::new("Bepoz", MerchantScope::All, CardType::DomesticCredit);
        assert_eq!(state.parent_base_ttv(&key), dec!(1000));
        assert_eq!(state.row(&key).unwrap().base.gp, dec!(3));
    }

    #[test]
    fn test_reset_restores_base() {
        let (model, _) = aggregate_card_types(&rows());
        let mut state = AssumptionState::from_model(&model);
        state.rows[0].assumption.ttv = dec!(1);
        assert!(!state.is_pristine());
        assert!(state.reset().is_pristine());
    }

    #[test]
    fn test_rederive_gp_identity() {
        let mut v = ValueSet {
            ttv: dec!(1000),
            msf: dec!(15),
            coa: dec!(5),
            ..ValueSet::default()
        };
        v.rederive_gp();
        assert_eq!(v.gp, dec!(10));
        assert_eq!(v.gp_bips, dec!(100));

        v.ttv = Decimal::ZERO;
        v.rederive_gp();
        assert_eq!(v.gp_bips, Decimal::ZERO);
    }

    #[test]
    fn test_checked_rederive_gp_keeps_values_on_overflow() {
        let mut v = ValueSet {
            ttv: dec!(1000),
            msf: Decimal::MAX,
            coa: dec!(-1),
            ..ValueSet::default()
        };
        let before = v;
        assert_eq!(v.checked_rederive_gp(), None);
        assert_eq!(v, before);

        v.rederive_gp();
        assert_eq!(v.gp, Decimal::MAX);
    }
}
