use std::cmp::Ordering;

/// Raw source system → display label. Sources not listed keep their raw name.
const BUSINESS_UNIT_RENAMES: &[(&str, &str)] = &[
    ("Swiftpos_Reseller", "SwiftPOS Reseller"),
    ("OolioPay", "Oolio Pay"),
    ("IdealPOS_Reseller", "IdealPOS Reseller"),
    ("Oolio", "Oolio Platform"),
    ("OolioPaymentPlatform", "Oolio Platform"),
];

/// Row order for business-unit tables.
pub const BUSINESS_UNIT_ORDER: &[&str] = &[
    "Bepoz",
    "Deliverit",
    "Ordermate",
    "SwiftPOS",
    "SwiftPOS Reseller",
    "IdealPOS",
    "IdealPOS Reseller",
    "Oolio Platform",
    "Oolio Pay",
    "Other",
];

/// Normalise a raw source identifier. Total and deterministic.
pub fn normalize_business_unit(raw: &str) -> String {
    let raw = raw.trim();
    BUSINESS_UNIT_RENAMES
        .iter()
        .find(|(from, _)| *from == raw)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Compare two normalised labels by display order; units outside the fixed
/// order come last, alphabetically.
pub fn compare_business_units(a: &str, b: &str) -> Ordering {
    let rank = |bu: &str| {
        BUSINESS_UNIT_ORDER
            .iter()
            .position(|known| *known == bu)
            .unwrap_or(BUSINESS_UNIT_ORDER.len())
    };
    rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}
