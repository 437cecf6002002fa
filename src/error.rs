//! Error types for structure validation and waterfall calculation

use thiserror::Error;

/// A promote structure that breaks the tier contract
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidStructureError {
    #[error("promote structure has no tiers")]
    NoTiers,

    #[error("tier {tier_order}: gp split {gp_split} + lp split {lp_split} must equal 100")]
    SplitsDoNotSumTo100 {
        tier_order: u32,
        gp_split: f64,
        lp_split: f64,
    },

    #[error("tier {tier_order}: split {split} must be between 0 and 100")]
    SplitOutOfRange { tier_order: u32, split: f64 },

    #[error("tier {tier_order}: hurdle {hurdle} must be a number above -100")]
    InvalidHurdle { tier_order: u32, hurdle: f64 },

    #[error("tier order {tier_order} appears more than once")]
    DuplicateTierOrder { tier_order: u32 },

    #[error("tier order {found} is out of sequence, expected {expected}")]
    TierOrderNotSequential { expected: u32, found: u32 },

    #[error("structure {structure_id} belongs to deal {owner} and cannot be saved for {deal_id}")]
    OwnedByAnotherDeal {
        structure_id: String,
        owner: String,
        deal_id: String,
    },

    #[error("tier {tier_order}: hurdle {hurdle} must be above the previous tier's hurdle {previous}")]
    HurdleNotIncreasing {
        tier_order: u32,
        hurdle: f64,
        previous: f64,
    },
}

/// Failures that stop a calculation before any year is processed
#[derive(Debug, Error)]
pub enum WaterfallError {
    #[error(transparent)]
    InvalidStructure(#[from] InvalidStructureError),

    #[error("cash flow years must strictly increase: {year} follows {previous}")]
    YearsNotIncreasing { previous: i32, year: i32 },

    #[error("cash flows span {first_year} to {last_year}, more than {max_years} years")]
    HoldTooLong {
        first_year: i32,
        last_year: i32,
        max_years: i64,
    },

    #[error("invested capital for {party} cannot be negative")]
    NegativeInvestedCapital { party: crate::metrics::Party },

    #[error("structure {structure_id} not found for deal {deal_id}")]
    StructureNotFound { deal_id: String, structure_id: String },

    #[error("no cash flow projection available for deal {0}")]
    ProjectionNotFound(String),

    #[error("structure {structure_id} belongs to deal {owner}, not {deal_id}")]
    DealMismatch {
        deal_id: String,
        structure_id: String,
        owner: String,
    },
}

impl WaterfallError {
    /// Whether the caller sent something unusable (as opposed to asking for
    /// something that does not exist)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            WaterfallError::InvalidStructure(_)
                | WaterfallError::YearsNotIncreasing { .. }
                | WaterfallError::HoldTooLong { .. }
                | WaterfallError::NegativeInvestedCapital { .. }
                | WaterfallError::DealMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_error_converts() {
        let err: WaterfallError = InvalidStructureError::NoTiers.into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "promote structure has no tiers");
    }

    #[test]
    fn test_hold_too_long_is_validation() {
        let err = WaterfallError::HoldTooLong {
            first_year: 2000,
            last_year: 2500,
            max_years: 200,
        };
        assert!(err.is_validation());
        assert!(err.to_string().contains("2500"));
    }

    #[test]
    fn test_not_found_is_not_validation() {
        let err = WaterfallError::ProjectionNotFound("deal-9".to_string());
        assert!(!err.is_validation());
        assert!(err.to_string().contains("deal-9"));
    }
}
