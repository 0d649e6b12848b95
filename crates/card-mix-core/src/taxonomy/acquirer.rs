use serde::{Deserialize, Serialize};

/// Acquiring channel a transaction settled through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Acquirer {
    AdyenManaged,
    AdyenBalance,
    Wpay,
    Other(String),
}

impl Acquirer {
    /// Parse a raw or display acquirer name. Case, spaces and underscores
    /// are ignored; anything mentioning "wpay" is Wpay.
    pub fn parse(raw: &str) -> Acquirer {
        let key: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        if key.contains("wpay") {
            return Acquirer::Wpay;
        }
        match key.as_str() {
            "adyenmanaged" => Acquirer::AdyenManaged,
            "adyenbalance" => Acquirer::AdyenBalance,
            _ => Acquirer::Other(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Acquirer::AdyenManaged => "Adyen Managed",
            Acquirer::AdyenBalance => "Adyen Balance",
            Acquirer::Wpay => "Wpay",
            Acquirer::Other(name) => name,
        }
    }

    /// Wpay reports no card-type granularity beyond AMEX and EFTPOS.
    pub fn is_wpay(&self) -> bool {
        matches!(self, Acquirer::Wpay)
    }
}

impl std::fmt::Display for Acquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
