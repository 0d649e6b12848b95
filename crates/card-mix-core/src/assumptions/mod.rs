//! Editable assumption values layered over the card-type aggregates.
//!
//! Base values never change after aggregation. Assumption values start equal
//! to base and move only through [`update`], the scenario presets or
//! [`AssumptionState::reset`].

pub mod engine;
pub mod input;
pub mod state;

pub use engine::{edit_percent, edit_rate, update, update_assumptions, AssumptionEdit, RateMetric, UpdateInput};
pub use input::parse_assumption_value;
pub use state::{AssumptionRow, AssumptionState, ValueSet};
