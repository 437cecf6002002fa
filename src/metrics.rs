//! Whole-hold return metrics for each party
//!
//! Reduces the yearly distribution series into IRR and equity multiple for
//! the GP and the LP independently. A party whose IRR cannot be solved gets
//! `None` plus a warning; the other party's figures are unaffected.

use std::fmt;

use log::warn;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cashflow::InvestedCapital;
use crate::config::SolverConfig;
use crate::waterfall::{calculate_irr, YearlyDistribution};

/// Side of the partnership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Gp,
    Lp,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Gp => write!(f, "GP"),
            Party::Lp => write!(f, "LP"),
        }
    }
}

/// Non-fatal conditions attached to a calculation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalculationWarning {
    /// No IRR exists or none was found inside the solver bracket
    IrrUndefined { party: Party },
    /// The party put in no capital, so its multiple is reported as 0
    ZeroInvestedCapital { party: Party },
}

/// Return summary for one party
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyMetrics {
    /// Net of capital calls; equals the party's final cumulative distribution
    #[serde(with = "rust_decimal::serde::float")]
    pub total_distribution: Decimal,

    /// Positive distributions only
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_distributions: Decimal,

    /// Initial capital plus capital called
    #[serde(with = "rust_decimal::serde::float")]
    pub invested_capital: Decimal,

    /// Annual IRR in percent; None when undefined
    pub irr: Option<f64>,

    /// Gross distributions over invested capital
    pub multiple: f64,
}

/// GP and LP metrics with any warnings raised while computing them
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceMetrics {
    pub gp: PartyMetrics,
    pub lp: PartyMetrics,
    pub warnings: Vec<CalculationWarning>,
}

/// Reduce a yearly distribution series into per-party metrics
pub fn summarize(
    yearly: &[YearlyDistribution],
    capital: &InvestedCapital,
    solver: &SolverConfig,
) -> PerformanceMetrics {
    let mut warnings = Vec::new();
    let gp = party_metrics(yearly, capital.gp, Party::Gp, solver, &mut warnings);
    let lp = party_metrics(yearly, capital.lp, Party::Lp, solver, &mut warnings);
    PerformanceMetrics { gp, lp, warnings }
}

fn party_metrics(
    yearly: &[YearlyDistribution],
    initial_capital: Decimal,
    party: Party,
    solver: &SolverConfig,
    warnings: &mut Vec<CalculationWarning>,
) -> PartyMetrics {
    let amounts: Vec<Decimal> = yearly.iter().map(|y| y.distribution_for(party)).collect();

    let total_distribution: Decimal = amounts.iter().copied().sum();
    let gross_distributions: Decimal = amounts.iter().filter(|a| a.is_sign_positive()).copied().sum();
    let capital_called: Decimal = amounts.iter().filter(|a| a.is_sign_negative()).map(|a| -*a).sum();
    let invested_capital = initial_capital + capital_called;

    let multiple = if invested_capital.is_zero() {
        warn!("{} invested no capital; reporting multiple as 0", party);
        warnings.push(CalculationWarning::ZeroInvestedCapital { party });
        0.0
    } else {
        (gross_distributions / invested_capital).to_f64().unwrap_or(0.0)
    };

    let flows = party_cash_flows(yearly, initial_capital, party);
    let irr = calculate_irr(&flows, solver).map(|r| r * 100.0);
    if irr.is_none() {
        warn!("{} IRR is undefined for this cash flow series", party);
        warnings.push(CalculationWarning::IrrUndefined { party });
    }

    PartyMetrics {
        total_distribution,
        gross_distributions,
        invested_capital,
        irr,
        multiple,
    }
}

/// Signed yearly cash flows seen by one party, indexed by years since close.
///
/// Index 0 holds minus the initial capital. The first projection year lands
/// at index 1 and later years keep their distance from it, so a gap in the
/// series becomes zero-flow years.
pub fn party_cash_flows(yearly: &[YearlyDistribution], initial_capital: Decimal, party: Party) -> Vec<f64> {
    let periods = match (yearly.first(), yearly.last()) {
        (Some(first), Some(last)) => period_of(last.year, first.year) + 1,
        _ => 1,
    };

    let mut flows = vec![0.0; periods];
    flows[0] = -initial_capital.to_f64().unwrap_or(0.0);

    if let Some(first) = yearly.first() {
        for y in yearly {
            flows[period_of(y.year, first.year)] += y.distribution_for(party).to_f64().unwrap_or(0.0);
        }
    }

    flows
}

/// Years elapsed since close for a projection year
pub fn period_of(year: i32, first_year: i32) -> usize {
    (i64::from(year) - i64::from(first_year) + 1).max(1) as usize
}
