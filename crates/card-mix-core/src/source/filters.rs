use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::source::rows::TransactionRow;
use crate::taxonomy::{normalize_business_unit, Acquirer};

/// A filter dimension: everything, or an explicit set of values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SelectionRepr", into = "SelectionRepr")]
pub enum Selection {
    #[default]
    All,
    Only(Vec<String>),
}

/// Wire form: `"All"`, a single value, or a list. A list that is empty or
/// contains "All" means All.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum SelectionRepr {
    One(String),
    Many(Vec<String>),
}

impl From<SelectionRepr> for Selection {
    fn from(repr: SelectionRepr) -> Self {
        match repr {
            SelectionRepr::One(value) => Selection::from_values(vec![value]),
            SelectionRepr::Many(values) => Selection::from_values(values),
        }
    }
}

impl From<Selection> for SelectionRepr {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::All => SelectionRepr::One("All".to_string()),
            Selection::Only(values) => SelectionRepr::Many(values),
        }
    }
}

impl Selection {
    pub fn from_values(values: Vec<String>) -> Selection {
        let values: Vec<String> = values
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() || values.iter().any(|v| v.eq_ignore_ascii_case("all")) {
            Selection::All
        } else {
            let mut values = values;
            values.sort();
            values.dedup();
            Selection::Only(values)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    fn matches_with(&self, pred: impl Fn(&str) -> bool) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(values) => values.iter().any(|v| pred(v)),
        }
    }

    fn key(&self) -> String {
        match self {
            Selection::All => "All".to_string(),
            Selection::Only(values) => values.join("|"),
        }
    }
}

/// The dashboard's filter bar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    /// Raw source values or normalised business-unit labels
    #[serde(default, alias = "business_unit_filter")]
    pub business_units: Selection,
    /// Acquirer names in raw or display form
    #[serde(default, alias = "acquirer_filter")]
    pub acquirers: Selection,
    /// Period keys, e.g. "2025-02"
    #[serde(default, alias = "trading_month_filter")]
    pub trading_months: Selection,
    #[serde(default, alias = "merchant_filter")]
    pub merchants: Selection,
    #[serde(default, alias = "account_manager_filter")]
    pub account_managers: Selection,
}

impl FilterSelection {
    pub fn all() -> Self {
        FilterSelection::default()
    }

    pub fn matches(&self, row: &TransactionRow) -> bool {
        let bu_label = normalize_business_unit(&row.business_unit_raw);
        let acquirer = row.acquirer();
        let merchant = row.merchant_name().unwrap_or("");
        let manager = row.account_manager.as_deref().unwrap_or("");

        self.business_units
            .matches_with(|v| v == row.business_unit_raw.trim() || v == bu_label)
            && self
                .acquirers
                .matches_with(|v| Acquirer::parse(v) == acquirer)
            && self
                .trading_months
                .matches_with(|v| v == row.trading_month.trim())
            && self.merchants.matches_with(|v| v == merchant)
            && self.account_managers.matches_with(|v| v == manager)
    }

    pub fn apply<'a>(&self, rows: &'a [TransactionRow]) -> Vec<&'a TransactionRow> {
        rows.iter().filter(|r| self.matches(r)).collect()
    }

    /// Deterministic memoisation key. Selections are sorted on construction,
    /// so equal selections give equal keys regardless of input order.
    pub fn cache_key(&self) -> String {
        format!(
            "bu={};acq={};month={};merchant={};am={}",
            self.business_units.key(),
            self.acquirers.key(),
            self.trading_months.key(),
            self.merchants.key(),
            self.account_managers.key()
        )
    }
}

/// Default trading-month filter: the calendar month before `today`,
/// formatted "YYYY-MM".
pub fn previous_month(today: NaiveDate) -> String {
    let (year, month) = if today.month() == 1 {
        (today.year() - 1, 12)
    } else {
        (today.year(), today.month() - 1)
    };
    format!("{year:04}-{month:02}")
}
