use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg, Sub};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Basis points: value / TTV * 10_000.
pub type Bips = Decimal;

/// Percentages on the 0..100 scale (30 = 30%). Never as fractions.
pub type Percent = Decimal;

/// Multiplier between a ratio and basis points.
pub const BIPS_SCALE: Decimal = dec!(10000);

/// Multiplier between a ratio and a percentage.
pub const PERCENT_SCALE: Decimal = dec!(100);

/// Division that resolves a zero denominator to zero instead of failing. A
/// quotient beyond the Decimal range saturates.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or_else(|| {
        if numerator.is_sign_negative() == denominator.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        }
    })
}

/// `value / ttv * 10_000`, or zero when TTV is zero.
pub fn to_bips(value: Money, ttv: Money) -> Bips {
    safe_div(value, ttv).saturating_mul(BIPS_SCALE)
}

/// [`to_bips`], or `None` when the ratio leaves the Decimal range.
pub fn checked_to_bips(value: Money, ttv: Money) -> Option<Bips> {
    if ttv.is_zero() {
        return Some(Decimal::ZERO);
    }
    value.checked_div(ttv)?.checked_mul(BIPS_SCALE)
}

/// `ttv * bips / 10_000`, or `None` when the amount leaves the Decimal range.
pub fn checked_from_bips(ttv: Money, bips: Bips) -> Option<Money> {
    match ttv.checked_mul(bips) {
        Some(product) => Some(product / BIPS_SCALE),
        None => (ttv / BIPS_SCALE).checked_mul(bips),
    }
}

/// `ttv * bips / 10_000`, saturating at the Decimal range.
pub fn from_bips(ttv: Money, bips: Bips) -> Money {
    checked_from_bips(ttv, bips).unwrap_or_else(|| (ttv / BIPS_SCALE).saturating_mul(bips))
}

/// `part / total * 100`, or zero when the total is zero.
pub fn percent_of(part: Money, total: Money) -> Percent {
    safe_div(part, total).saturating_mul(PERCENT_SCALE)
}

/// The four summed measures carried by every transaction and aggregate row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSet {
    pub ttv: Money,
    pub msf: Money,
    pub coa: Money,
    pub surcharge: Money,
}

impl MetricSet {
    pub const ZERO: MetricSet = MetricSet {
        ttv: Decimal::ZERO,
        msf: Decimal::ZERO,
        coa: Decimal::ZERO,
        surcharge: Decimal::ZERO,
    };

    pub fn new(ttv: Money, msf: Money, coa: Money, surcharge: Money) -> Self {
        MetricSet {
            ttv,
            msf,
            coa,
            surcharge,
        }
    }

    /// Gross profit: MSF - COA.
    pub fn gp(&self) -> Money {
        self.msf - self.coa
    }

    pub fn scale(&self, factor: Decimal) -> Self {
        MetricSet {
            ttv: self.ttv * factor,
            msf: self.msf * factor,
            coa: self.coa * factor,
            surcharge: self.surcharge * factor,
        }
    }

    /// Field-wise absolute values (the source system signs MSF and fees
    /// differently depending on origin).
    pub fn abs(&self) -> Self {
        MetricSet {
            ttv: self.ttv.abs(),
            msf: self.msf.abs(),
            coa: self.coa.abs(),
            surcharge: self.surcharge.abs(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.ttv.is_zero() && self.msf.is_zero() && self.coa.is_zero() && self.surcharge.is_zero()
    }
}

impl Add for MetricSet {
    type Output = MetricSet;

    fn add(self, rhs: MetricSet) -> MetricSet {
        MetricSet {
            ttv: self.ttv + rhs.ttv,
            msf: self.msf + rhs.msf,
            coa: self.coa + rhs.coa,
            surcharge: self.surcharge + rhs.surcharge,
        }
    }
}

impl AddAssign for MetricSet {
    fn add_assign(&mut self, rhs: MetricSet) {
        *self = *self + rhs;
    }
}

impl Sub for MetricSet {
    type Output = MetricSet;

    fn sub(self, rhs: MetricSet) -> MetricSet {
        self + (-rhs)
    }
}

impl Neg for MetricSet {
    type Output = MetricSet;

    fn neg(self) -> MetricSet {
        MetricSet {
            ttv: -self.ttv,
            msf: -self.msf,
            coa: -self.coa,
            surcharge: -self.surcharge,
        }
    }
}

impl std::iter::Sum for MetricSet {
    fn sum<I: Iterator<Item = MetricSet>>(iter: I) -> Self {
        iter.fold(MetricSet::ZERO, |acc, m| acc + m)
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_denominators_resolve_to_zero() {
        assert_eq!(safe_div(dec!(5), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(to_bips(dec!(120), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(percent_of(dec!(1), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_bips_round_trip_on_known_values() {
        // 6,500 on 1,000,000 is 65 bips
        assert_eq!(to_bips(dec!(6500), dec!(1_000_000)), dec!(65));
        assert_eq!(from_bips(dec!(1_000_000), dec!(65)), dec!(6500));
    }

    #[test]
    fn test_out_of_range_rates() {
        let huge = Decimal::MAX;
        assert_eq!(checked_from_bips(dec!(1_200_000), huge), None);
        assert_eq!(from_bips(dec!(1_200_000), huge), Decimal::MAX);
        assert_eq!(from_bips(dec!(-1_200_000), huge), Decimal::MIN);
        // The product overflows but the amount fits once divided down
        assert_eq!(checked_from_bips(dec!(10_000), huge), Some(huge));
        assert_eq!(checked_to_bips(huge, dec!(0.5)), None);
        assert_eq!(to_bips(huge, dec!(0.5)), Decimal::MAX);
        assert_eq!(safe_div(huge, dec!(-0.5)), Decimal::MIN);
    }

    #[test]
    fn test_metric_set_gp_and_negation() {
        let m = MetricSet::new(dec!(1000), dec!(12), dec!(7), dec!(3));
        assert_eq!(m.gp(), dec!(5));
        let n = -m;
        assert_eq!(n.gp(), dec!(-5));
        assert!((m + n).is_zero());
    }
}
