use card_mix_core::aggregation::{aggregate_card_types, MerchantScope, RowKey};
use card_mix_core::assumptions::{
    edit_percent, parse_assumption_value, update, update_assumptions, AssumptionEdit,
    AssumptionState, RateMetric, UpdateInput,
};
use card_mix_core::report::ModelTable;
use card_mix_core::scenarios::{apply_scenario, ScenarioInput, ScenarioPreset, ScenarioTable};
use card_mix_core::source::TransactionRow;
use card_mix_core::taxonomy::CardType;
use card_mix_core::CardMixError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

fn tx(variant: &str, merchant: &str, ttv: Decimal, msf_bips: Decimal, coa_bips: Decimal) -> TransactionRow {
    TransactionRow {
        business_unit_raw: "SwiftPOS".into(),
        payment_method_variant: variant.into(),
        payment_method: String::new(),
        acquirer: "adyen_managed".into(),
        trading_month: "2025-02".into(),
        merchant: Some(merchant.into()),
        merchant_account: None,
        account_manager: None,
        ttv,
        msf: ttv * msf_bips / dec!(10000),
        coa: ttv * coa_bips / dec!(10000),
        surcharge: Decimal::ZERO,
    }
}

/// Group base TTV of 2,000,000 at business-unit level:
/// EFTPOS 600k, Dom.DR 1M, Dom.CR 300k, Prem.CR 100k.
fn loaded_state() -> AssumptionState {
    let rows = vec![
        tx("eftpos_australia", "Pub", dec!(600_000), dec!(50), dec!(20)),
        tx("mcdebit", "Pub", dec!(1_000_000), dec!(80), dec!(30)),
        tx("visa", "Club", dec!(300_000), dec!(120), dec!(60)),
        tx("visapremiumcredit", "Club", dec!(100_000), dec!(180), dec!(90)),
    ];
    let (model, _) = aggregate_card_types(&rows);
    AssumptionState::from_model(&model)
}

fn key(ct: CardType) -> RowKey {
    RowKey::new("SwiftPOS", MerchantScope::All, ct)
}

fn assumption_of(state: &AssumptionState, ct: CardType) -> card_mix_core::assumptions::ValueSet {
    state.row(&key(ct)).unwrap().assumption
}

fn assert_gp_identity(state: &AssumptionState) {
    for r in &state.rows {
        assert_eq!(r.base.gp, r.base.msf - r.base.coa, "base {}", r.key);
        assert_eq!(r.assumption.gp, r.assumption.msf - r.assumption.coa, "assumption {}", r.key);
    }
}

// ===========================================================================
// Edits
// ===========================================================================

#[test]
fn test_edit_percent_against_parent_base() {
    // 30% of a 2,000,000 parent = 600,000
    let next = edit_percent(&loaded_state(), key(CardType::DomesticCredit), dec!(30)).unwrap();
    assert_eq!(assumption_of(&next, CardType::DomesticCredit).ttv, dec!(600_000));

    // A second edit on the same row still uses base, not the edited value
    let again = edit_percent(&next, key(CardType::DomesticCredit), dec!(10)).unwrap();
    assert_eq!(assumption_of(&again, CardType::DomesticCredit).ttv, dec!(200_000));
}

#[test]
fn test_merchant_scope_has_its_own_parent() {
    let club = RowKey::new("SwiftPOS", MerchantScope::Named("Club".into()), CardType::DomesticCredit);
    let next = edit_percent(&loaded_state(), club.clone(), dec!(50)).unwrap();
    // Club base TTV is 400,000
    assert_eq!(next.row(&club).unwrap().assumption.ttv, dec!(200_000));
}

#[test]
fn test_bulk_update_with_typed_values() {
    let edits = vec![
        AssumptionEdit::Rate {
            key: key(CardType::Eftpos),
            metric: RateMetric::Msf,
            bips: parse_assumption_value("55"),
        },
        AssumptionEdit::Rate {
            key: key(CardType::Eftpos),
            metric: RateMetric::Coa,
            bips: parse_assumption_value("not a number"),
        },
    ];
    let next = update(&loaded_state(), &edits).unwrap();
    let eftpos = assumption_of(&next, CardType::Eftpos);
    assert_eq!(eftpos.msf, dec!(3300));
    assert_eq!(eftpos.coa, Decimal::ZERO);
    assert_eq!(eftpos.gp, dec!(3300));
    assert_eq!(eftpos.gp_bips, dec!(55));
    assert_gp_identity(&next);
}

#[test]
fn test_update_idempotence_and_rejection() {
    let s = loaded_state();
    assert_eq!(update(&s, &[]).unwrap(), s);

    let bad = vec![AssumptionEdit::Percent {
        key: RowKey::new("Nowhere", MerchantScope::All, CardType::Amex),
        pct: dec!(10),
    }];
    let err = update_assumptions(&UpdateInput {
        state: s.clone(),
        edits: bad,
    })
    .unwrap_err();
    assert!(matches!(err, CardMixError::InvalidInput { .. }));
}

#[test]
fn test_reset_after_edits() {
    let s = loaded_state();
    let edited = edit_percent(&s, key(CardType::Eftpos), dec!(5)).unwrap();
    assert_eq!(edited.reset(), s);
}

// ===========================================================================
// Presets
// ===========================================================================

#[test]
fn test_scenario_1_dom_dr_msf() {
    // Dom.DR base TTV 1,000,000 at 65 bips
    let next = ScenarioPreset::SurchargeBan.apply(&loaded_state());
    assert_eq!(assumption_of(&next, CardType::DomesticDebit).msf, dec!(6500));
}

#[test]
fn test_scenario_5_eftpos_ttv() {
    // Card mix puts EFTPOS at 40% of 2,000,000 = 800,000; churn keeps 85%
    let next = ScenarioPreset::Churn.apply(&loaded_state());
    let eftpos = assumption_of(&next, CardType::Eftpos);
    assert_eq!(eftpos.ttv, dec!(680_000));
    assert_eq!(eftpos.pct_of_parent, dec!(34));
}

#[test]
fn test_scenario_5_on_a_one_million_group() {
    let rows = vec![tx("eftpos_australia", "Pub", dec!(1_000_000), dec!(50), dec!(20))];
    let (model, _) = aggregate_card_types(&rows);
    let state = AssumptionState::from_model(&model);
    let mixed = ScenarioPreset::CardMix.apply(&state);
    let eftpos_key = RowKey::new("SwiftPOS", MerchantScope::All, CardType::Eftpos);
    assert_eq!(mixed.row(&eftpos_key).unwrap().assumption.ttv, dec!(400_000));

    let churned = ScenarioPreset::Churn.apply(&state);
    assert_eq!(churned.row(&eftpos_key).unwrap().assumption.ttv, dec!(340_000));
}

#[test]
fn test_every_preset_keeps_gp_identity() {
    let s = loaded_state();
    for preset in ScenarioPreset::ALL {
        let out = apply_scenario(&ScenarioInput {
            state: s.clone(),
            scenario: preset,
        })
        .unwrap();
        assert_gp_identity(&out.result);
    }
}

#[test]
fn test_presets_feed_scenario_table() {
    let s = loaded_state();
    let mut table = ScenarioTable::new(&s);
    for (slot, preset) in ScenarioPreset::ALL.into_iter().enumerate() {
        let next = preset.apply(&s);
        table.save(slot + 1, &next, Some(preset.description().to_string())).unwrap();
    }
    let rows = table.rows();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0].totals.ttv_assumption, dec!(2_000_000));
    // Four card types hold 40 + 25 + 4 + 15 = 84% of the target mix;
    // churn keeps 85% of that: 2,000,000 * 0.84 * 0.85
    assert_eq!(rows[5].totals.ttv_assumption, dec!(1_428_000));

    let model_table = ModelTable::from_state(&ScenarioPreset::Churn.apply(&s));
    assert_eq!(model_table.total.ttv_assumption, dec!(1_428_000));
}
