//! Fixed lookup tables shared by the classifier, the Wpay apportionment and
//! the scenario presets. Every table lives here exactly once.

pub mod acquirer;
pub mod business_unit;
pub mod card_type;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub use acquirer::Acquirer;
pub use business_unit::{compare_business_units, normalize_business_unit, BUSINESS_UNIT_ORDER};
pub use card_type::{classify, CardType};

/// Market-assumption weights used to split the Wpay remainder (everything
/// that is not AMEX or EFTPOS). Normalised at use, so they need not sum to 1.
pub const WPAY_REMAINDER_WEIGHTS: [(CardType, Decimal); 6] = [
    (CardType::DomesticDebit, dec!(25)),
    (CardType::DomesticCredit, dec!(18.5)),
    (CardType::PremiumDebit, dec!(10)),
    (CardType::PremiumCredit, dec!(9.52)),
    (CardType::InternationalDebit, dec!(3)),
    (CardType::InternationalCredit, dec!(0.5)),
];

/// MSF bips applied to debit card types under a surcharge ban.
pub const DEBIT_SURCHARGE_BAN_MSF_BIPS: Decimal = dec!(65);

/// MSF bips for credit and international types when the surcharge moves
/// onto credit.
pub const CREDIT_INCREASE_MSF_BIPS: [(CardType, Decimal); 5] = [
    (CardType::Amex, dec!(170)),
    (CardType::DomesticCredit, dec!(160)),
    (CardType::PremiumCredit, dec!(160)),
    (CardType::InternationalCredit, dec!(250)),
    (CardType::InternationalDebit, dec!(250)),
];

/// COA bips reductions negotiated on credit types.
pub const CREDIT_COA_REDUCTION_BIPS: [(CardType, Decimal); 4] = [
    (CardType::DomesticCredit, dec!(10)),
    (CardType::PremiumCredit, dec!(30)),
    (CardType::InternationalCredit, dec!(30)),
    (CardType::InternationalDebit, dec!(30)),
];

/// Target card mix (percent of group TTV). Sums to 100.
pub const TARGET_CARD_MIX_PCT: [(CardType, Decimal); 8] = [
    (CardType::Amex, dec!(5)),
    (CardType::Eftpos, dec!(40)),
    (CardType::DomesticDebit, dec!(25)),
    (CardType::DomesticCredit, dec!(4)),
    (CardType::PremiumDebit, dec!(7)),
    (CardType::PremiumCredit, dec!(15)),
    (CardType::InternationalDebit, dec!(2)),
    (CardType::InternationalCredit, dec!(2)),
];

/// Share of volume retained after merchant churn.
pub const CHURN_RETENTION: Decimal = dec!(0.85);

/// Australian GST multiplier; reported fees include GST.
pub const GST_DIVISOR: Decimal = dec!(1.1);

/// Look up a card type in one of the fixed (card type, value) tables.
pub fn lookup<const N: usize>(table: &[(CardType, Decimal); N], card_type: CardType) -> Option<Decimal> {
    table
        .iter()
        .find(|(ct, _)| *ct == card_type)
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_mix_sums_to_one_hundred() {
        let total: Decimal = TARGET_CARD_MIX_PCT.iter().map(|(_, p)| *p).sum();
        assert_eq!(total, dec!(100));
    }

    #[test]
    fn test_wpay_weights_cover_non_direct_types() {
        for ct in CardType::MODELLED {
            let weighted = lookup(&WPAY_REMAINDER_WEIGHTS, ct).is_some();
            let direct = matches!(ct, CardType::Amex | CardType::Eftpos);
            assert_ne!(weighted, direct, "{ct} must be either direct or weighted");
        }
    }

    #[test]
    fn test_lookup_missing_is_none() {
        assert_eq!(lookup(&CREDIT_COA_REDUCTION_BIPS, CardType::Amex), None);
        assert_eq!(
            lookup(&CREDIT_INCREASE_MSF_BIPS, CardType::Amex),
            Some(dec!(170))
        );
    }
}
