pub mod card_types;
pub mod pivot;
pub mod summary;

pub use card_types::{
    aggregate_card_types, build_card_type_model, AdjustmentRow, AggregateRow, CardTypeModel,
    MerchantScope, RowKey, ADJUSTMENT_MERCHANT, ALL_MERCHANTS, RESERVED_MERCHANT_SUFFIX,
};
pub use pivot::{pivot_by_card_type, pivot_model, CardTypePivot, PivotMetric};
pub use summary::{summarize_business_units, BusinessUnitSummary, SummaryOptions};
