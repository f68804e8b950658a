//! Policy period proration across calendar quarters

mod quarter;
mod proration;
pub mod export;

pub use quarter::Quarter;
pub use proration::{
    calculate, prorate, reconcile_to_cents, validate, DeductionSplit, PolicyPeriodError,
    PolicyPeriodInput, PolicyPeriodResult, PolicyPeriodSummary, ValidatedPeriod,
    DEFAULT_DEDUCTIBLE_SHARE,
};
