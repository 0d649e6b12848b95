use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CardMixError;

/// Canonical card-type buckets, declared in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardType {
    #[serde(rename = "AMEX")]
    Amex,
    #[serde(rename = "EFTPOS")]
    Eftpos,
    #[serde(rename = "Dom.DR")]
    DomesticDebit,
    #[serde(rename = "Dom.CR")]
    DomesticCredit,
    #[serde(rename = "Prem.DR")]
    PremiumDebit,
    #[serde(rename = "Prem.CR")]
    PremiumCredit,
    #[serde(rename = "Int.DR")]
    InternationalDebit,
    #[serde(rename = "Int.CR")]
    InternationalCredit,
    Other,
}

impl CardType {
    /// The eight modelled card types, in display order. `Other` is never a
    /// modelled column.
    pub const MODELLED: [CardType; 8] = [
        CardType::Amex,
        CardType::Eftpos,
        CardType::DomesticDebit,
        CardType::DomesticCredit,
        CardType::PremiumDebit,
        CardType::PremiumCredit,
        CardType::InternationalDebit,
        CardType::InternationalCredit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CardType::Amex => "AMEX",
            CardType::Eftpos => "EFTPOS",
            CardType::DomesticDebit => "Dom.DR",
            CardType::DomesticCredit => "Dom.CR",
            CardType::PremiumDebit => "Prem.DR",
            CardType::PremiumCredit => "Prem.CR",
            CardType::InternationalDebit => "Int.DR",
            CardType::InternationalCredit => "Int.CR",
            CardType::Other => "Other",
        }
    }

    pub fn is_modelled(&self) -> bool {
        !matches!(self, CardType::Other)
    }

    /// EFTPOS and the scheme debit buckets: the set a debit surcharge ban
    /// applies to.
    pub fn is_debit(&self) -> bool {
        matches!(
            self,
            CardType::Eftpos | CardType::DomesticDebit | CardType::PremiumDebit
        )
    }
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for CardType {
    type Err = CardMixError;

    /// Parses a display label ("Dom.DR", "amex", ...). Raw payment-method
    /// variants go through [`classify`] instead.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CardType::MODELLED
            .iter()
            .chain(std::iter::once(&CardType::Other))
            .find(|ct| ct.label().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| CardMixError::InvalidInput {
                field: "card_type".into(),
                reason: format!("'{s}' is not a card type label"),
            })
    }
}

/// Payment-method-variant codes per card type, as reported by the acquirer.
const CARD_TYPE_TABLE: &[(CardType, &[&str])] = &[
    (CardType::Amex, &["amex", "amex_applepay", "amex_googlepay"]),
    (
        CardType::Eftpos,
        &["eftpos_australia", "eftpos_australia_chq", "eftpos_australia_sav"],
    ),
    (
        CardType::DomesticCredit,
        &["visa", "mcstandardcredit", "mccredit", "visastandardcredit", "mc"],
    ),
    (
        CardType::DomesticDebit,
        &[
            "visaprepaidanonymous",
            "visastandarddebit",
            "mcprepaidanonymous",
            "mcdebit",
            "maestro",
            "mcstandarddebit",
            "visadebit",
        ],
    ),
    (
        CardType::PremiumCredit,
        &[
            "visapremiumcredit",
            "mcpremiumcredit",
            "visacorporatecredit",
            "visacommercialpremiumcredit",
            "mc_applepay",
            "visacommercialsuperpremiumcredit",
            "visa_applepay",
            "mccorporatecredit",
            "visa_googlepay",
            "mccommercialcredit",
            "mcfleetcredit",
            "visabusiness",
            "mcpurchasingcredit",
            "visapurchasingcredit",
            "mc_googlepay",
            "visasuperpremiumcredit",
            "visacommercialcredit",
            "visafleetcredit",
            "mcsuperpremiumcredit",
        ],
    ),
    (
        CardType::PremiumDebit,
        &[
            "visasuperpremiumdebit",
            "visapremiumdebit",
            "mcsuperpremiumdebit",
            "visacorporatedebit",
            "mcpremiumdebit",
            "visacommercialpremiumdebit",
            "mccommercialdebit",
            "mccorporatedebit",
            "visacommercialdebit",
            "visacommercialsuperpremiumdebit",
        ],
    ),
    (
        CardType::InternationalCredit,
        &["discover", "jcbcredit", "diners", "alipay", "cupcredit", "cup"],
    ),
    (
        CardType::InternationalDebit,
        &["vpay", "electron", "jcbdebit", "visadankort", "cupdebit"],
    ),
];

/// Classify a raw payment-method-variant code. Total over all inputs:
/// anything not in the table is `Other`.
pub fn classify(variant: &str) -> CardType {
    let code = variant.trim().to_ascii_lowercase();
    CARD_TYPE_TABLE
        .iter()
        .find(|(_, codes)| codes.contains(&code.as_str()))
        .map(|(card_type, _)| *card_type)
        .unwrap_or(CardType::Other)
}

/// Every known variant code with its card type, in table order.
pub fn known_variants() -> impl Iterator<Item = (&'static str, CardType)> {
    CARD_TYPE_TABLE
        .iter()
        .flat_map(|(ct, codes)| codes.iter().map(move |code| (*code, *ct)))
}
