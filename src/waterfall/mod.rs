//! Waterfall engine for splitting deal cash flows between GP and LP

mod distributions;
mod engine;
mod irr;
mod state;

pub use distributions::{percentage_of, TierAllocation, WaterfallCalculationResult, YearlyDistribution};
pub use engine::{WaterfallEngine, MONEY_SCALE};
pub use irr::{calculate_irr, npv_at_rate};
pub use state::{HurdleAccount, HurdleBalance, WaterfallState, HURDLE_TOLERANCE};
