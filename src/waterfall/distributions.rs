//! Output structures for waterfall calculations

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::metrics::{CalculationWarning, Party, PerformanceMetrics};

/// Portion of one year's cash allocated under a single tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierAllocation {
    pub tier_order: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gp_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub lp_amount: Decimal,
}

/// A single row of waterfall output for one projection year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyDistribution {
    pub year: i32,

    // This year's split
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cash_flow: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gp_distribution: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub lp_distribution: Decimal,

    // Running sums through this year
    #[serde(with = "rust_decimal::serde::float")]
    pub cumulative_gp: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cumulative_lp: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cumulative_total: Decimal,

    // This year's split as a percent of this year's cash flow
    pub gp_percentage: f64,
    pub lp_percentage: f64,

    /// How the year's cash was partitioned across tiers
    #[serde(default)]
    pub tier_allocations: Vec<TierAllocation>,

    /// LP IRR in percent through the end of this year
    #[serde(default)]
    pub lp_irr_to_date: Option<f64>,
}

impl YearlyDistribution {
    /// Row for a standalone year; cumulative fields equal this year's amounts
    pub fn new(year: i32, gp_distribution: Decimal, lp_distribution: Decimal) -> Self {
        let total_cash_flow = gp_distribution + lp_distribution;
        Self {
            year,
            total_cash_flow,
            gp_distribution,
            lp_distribution,
            cumulative_gp: gp_distribution,
            cumulative_lp: lp_distribution,
            cumulative_total: total_cash_flow,
            gp_percentage: percentage_of(gp_distribution, total_cash_flow),
            lp_percentage: percentage_of(lp_distribution, total_cash_flow),
            tier_allocations: Vec::new(),
            lp_irr_to_date: None,
        }
    }

    pub fn distribution_for(&self, party: Party) -> Decimal {
        match party {
            Party::Gp => self.gp_distribution,
            Party::Lp => self.lp_distribution,
        }
    }
}

/// `part / whole * 100`, or 0 when `whole` is zero
pub fn percentage_of(part: Decimal, whole: Decimal) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    (part / whole * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
}

/// Complete waterfall result for one (deal, structure, projection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallCalculationResult {
    pub deal_id: String,
    pub structure_id: String,
    pub structure_name: String,
    pub structure_version: u32,

    pub yearly_distributions: Vec<YearlyDistribution>,

    #[serde(with = "rust_decimal::serde::float")]
    pub total_gp_distribution: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_lp_distribution: Decimal,

    /// Annual IRRs in percent; null when undefined
    pub gp_irr: Option<f64>,
    pub lp_irr: Option<f64>,

    pub gp_multiple: f64,
    pub lp_multiple: f64,

    #[serde(default)]
    pub warnings: Vec<CalculationWarning>,
}

impl WaterfallCalculationResult {
    pub fn new(
        deal_id: impl Into<String>,
        structure_id: impl Into<String>,
        structure_name: impl Into<String>,
        structure_version: u32,
        yearly_distributions: Vec<YearlyDistribution>,
        metrics: PerformanceMetrics,
    ) -> Self {
        Self {
            deal_id: deal_id.into(),
            structure_id: structure_id.into(),
            structure_name: structure_name.into(),
            structure_version,
            yearly_distributions,
            total_gp_distribution: metrics.gp.total_distribution,
            total_lp_distribution: metrics.lp.total_distribution,
            gp_irr: metrics.gp.irr,
            lp_irr: metrics.lp.irr,
            gp_multiple: metrics.gp.multiple,
            lp_multiple: metrics.lp.multiple,
            warnings: metrics.warnings,
        }
    }

    pub fn irr_for(&self, party: Party) -> Option<f64> {
        match party {
            Party::Gp => self.gp_irr,
            Party::Lp => self.lp_irr,
        }
    }

    /// Whether a party's IRR was reported as undefined
    pub fn irr_undefined(&self, party: Party) -> bool {
        self.warnings.contains(&CalculationWarning::IrrUndefined { party })
    }

    /// Sum of every year's cash flow
    pub fn total_cash_flow(&self) -> Decimal {
        self.yearly_distributions.last().map(|y| y.cumulative_total).unwrap_or(Decimal::ZERO)
    }

    /// Share of all cash that went to the GP, in percent
    pub fn gp_share_of_total(&self) -> f64 {
        percentage_of(self.total_gp_distribution, self.total_cash_flow())
    }
}
