use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::taxonomy::{classify, normalize_business_unit, Acquirer, CardType};
use crate::types::{MetricSet, Money};

/// One warehouse row: a (source, variant, acquirer, month, merchant)
/// grouping with summed measures. Column aliases follow the warehouse
/// naming so exported files load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    /// Raw source system, e.g. "Swiftpos_Reseller"
    #[serde(alias = "SOURCE", alias = "source")]
    pub business_unit_raw: String,
    /// Raw payment-method variant, e.g. "visapremiumcredit"
    #[serde(alias = "PAYMENT_METHOD_VARIANT", default)]
    pub payment_method_variant: String,
    /// Coarse payment-method label ("AMEX", "EFTPOS", ...). The only card
    /// detail Wpay reports.
    #[serde(alias = "PAYMENT_METHOD", default)]
    pub payment_method: String,
    #[serde(alias = "ACQUIRER")]
    pub acquirer: String,
    /// Period key, e.g. "2025-02"
    #[serde(alias = "TRADING_MONTH")]
    pub trading_month: String,
    /// Merchant display name
    #[serde(
        alias = "DISPLAY_NAME",
        alias = "MERCHANT",
        default,
        deserialize_with = "empty_as_none"
    )]
    pub merchant: Option<String>,
    #[serde(alias = "MERCHANT_ACCOUNT", default, deserialize_with = "empty_as_none")]
    pub merchant_account: Option<String>,
    #[serde(alias = "ACCOUNT_MANAGER", default, deserialize_with = "empty_as_none")]
    pub account_manager: Option<String>,
    #[serde(alias = "TTV", default, deserialize_with = "zero_if_missing")]
    pub ttv: Money,
    #[serde(alias = "MSF", default, deserialize_with = "zero_if_missing")]
    pub msf: Money,
    /// Cost of acquisition (acquirer fee)
    #[serde(
        alias = "COA",
        alias = "ACQUIRER_FEE",
        alias = "acquirer_fee",
        default,
        deserialize_with = "zero_if_missing"
    )]
    pub coa: Money,
    #[serde(
        alias = "SURCHARGE",
        alias = "SURCHARGE_AMOUNT",
        alias = "surcharge_amount",
        default,
        deserialize_with = "zero_if_missing"
    )]
    pub surcharge: Money,
}

impl TransactionRow {
    pub fn card_type(&self) -> CardType {
        classify(&self.payment_method_variant)
    }

    pub fn business_unit(&self) -> String {
        normalize_business_unit(&self.business_unit_raw)
    }

    pub fn acquirer(&self) -> Acquirer {
        Acquirer::parse(&self.acquirer)
    }

    pub fn metrics(&self) -> MetricSet {
        MetricSet::new(self.ttv, self.msf, self.coa, self.surcharge)
    }

    /// The card type Wpay reports directly for this row, if any. Wpay only
    /// distinguishes AMEX and EFTPOS via the coarse payment method.
    pub fn wpay_direct_card_type(&self) -> Option<CardType> {
        let method = self.payment_method.trim();
        if method.eq_ignore_ascii_case("AMEX") {
            Some(CardType::Amex)
        } else if method.eq_ignore_ascii_case("EFTPOS") {
            Some(CardType::Eftpos)
        } else {
            None
        }
    }

    /// Named merchant, if the row carries a non-blank one.
    pub fn merchant_name(&self) -> Option<&str> {
        self.merchant
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

fn zero_if_missing<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Decimal>::deserialize(deserializer)?.unwrap_or(Decimal::ZERO))
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
