use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::aggregation::RowKey;
use crate::assumptions::state::AssumptionState;
use crate::error::CardMixError;
use crate::types::{
    checked_from_bips, with_metadata, Bips, ComputationOutput, Percent, PERCENT_SCALE,
};
use crate::CardMixResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Rate that can be edited in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateMetric {
    Msf,
    Coa,
}

/// One pending cell edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssumptionEdit {
    /// Set the row's share of its parent group's base TTV.
    Percent { key: RowKey, pct: Percent },
    /// Set the row's MSF or COA rate.
    Rate {
        key: RowKey,
        metric: RateMetric,
        bips: Bips,
    },
}

impl AssumptionEdit {
    pub fn key(&self) -> &RowKey {
        match self {
            AssumptionEdit::Percent { key, .. } | AssumptionEdit::Rate { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateInput {
    pub state: AssumptionState,
    #[serde(default)]
    pub edits: Vec<AssumptionEdit>,
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

fn unknown_row(key: &RowKey) -> CardMixError {
    CardMixError::InvalidInput {
        field: "key".into(),
        reason: format!("no card-type row for {key}"),
    }
}

fn out_of_range(field: &str, value: Decimal, key: &RowKey) -> CardMixError {
    CardMixError::InvalidInput {
        field: field.into(),
        reason: format!("{value} puts {key} outside the representable range"),
    }
}

fn apply_edit(state: &mut AssumptionState, edit: &AssumptionEdit) -> CardMixResult<()> {
    let key = edit.key();
    let parent_ttv = state.parent_base_ttv(key);
    let row = state.row_mut(key).ok_or_else(|| unknown_row(key))?;
    let mut a = row.assumption;

    let (field, value) = match *edit {
        AssumptionEdit::Percent { pct, .. } => {
            a.pct_of_parent = pct;
            a.ttv = (pct / PERCENT_SCALE)
                .checked_mul(parent_ttv)
                .ok_or_else(|| out_of_range("pct", pct, key))?;
            ("pct", pct)
        }
        AssumptionEdit::Rate {
            metric: RateMetric::Msf,
            bips,
            ..
        } => {
            a.msf_bips = bips;
            a.msf = checked_from_bips(row.base.ttv, bips)
                .ok_or_else(|| out_of_range("bips", bips, key))?;
            ("bips", bips)
        }
        AssumptionEdit::Rate {
            metric: RateMetric::Coa,
            bips,
            ..
        } => {
            a.coa_bips = bips;
            a.coa = checked_from_bips(row.base.ttv, bips)
                .ok_or_else(|| out_of_range("bips", bips, key))?;
            ("bips", bips)
        }
    };
    a.checked_rederive_gp().ok_or_else(|| out_of_range(field, value, key))?;
    row.assumption = a;
    Ok(())
}

/// Apply `edits` in order and return the new state.
///
/// Every key is checked before anything is applied, so an edit naming an
/// unknown row leaves the caller's state untouched. So does an edit whose
/// amounts leave the Decimal range. Edits carry absolute values: applying
/// the same batch twice gives the same state as once.
pub fn update(state: &AssumptionState, edits: &[AssumptionEdit]) -> CardMixResult<AssumptionState> {
    if let Some(bad) = edits.iter().find(|e| !state.contains(e.key())) {
        return Err(unknown_row(bad.key()));
    }

    let mut next = state.clone();
    for edit in edits {
        apply_edit(&mut next, edit)?;
    }
    log::debug!("applied {} assumption edits", edits.len());
    Ok(next)
}

pub fn edit_percent(state: &AssumptionState, key: RowKey, pct: Percent) -> CardMixResult<AssumptionState> {
    update(state, &[AssumptionEdit::Percent { key, pct }])
}

pub fn edit_rate(
    state: &AssumptionState,
    key: RowKey,
    metric: RateMetric,
    bips: Bips,
) -> CardMixResult<AssumptionState> {
    update(state, &[AssumptionEdit::Rate { key, metric, bips }])
}

/// Commit a batch of edits and wrap the new state in the standard envelope.
pub fn update_assumptions(input: &UpdateInput) -> CardMixResult<ComputationOutput<AssumptionState>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let next = update(&input.state, &input.edits)?;

    for edit in &input.edits {
        if let AssumptionEdit::Percent { key, .. } = edit {
            let group_pct: Percent = next
                .rows
                .iter()
                .filter(|r| r.key.is_sibling_of(key))
                .fold(Decimal::ZERO, |acc, r| acc.saturating_add(r.assumption.pct_of_parent));
            if group_pct != PERCENT_SCALE {
                warnings.push(format!(
                    "{} / {}: card-type shares sum to {group_pct}%",
                    key.business_unit, key.merchant
                ));
            }
        }
    }
    warnings.dedup();

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Assumption update: percent edits scale base group TTV, rate edits price base TTV",
        &serde_json::json!({
            "edits": input.edits.len(),
            "rows": input.state.rows.len(),
        }),
        warnings,
        elapsed,
        next,
    ))
}
