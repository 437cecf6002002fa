//! Cash flow projections feeding the waterfall
//!
//! The projection itself (NOI, debt service, exit proceeds) is produced
//! elsewhere. This module only carries the yearly net distributable amounts
//! and the equity contributed at close.

pub mod loader;

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use loader::{load_cash_flows, load_cash_flows_from_reader};

/// Net distributable cash for one projection year.
/// Negative amounts are capital calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyCashFlow {
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cash_flow: Decimal,
}

impl YearlyCashFlow {
    pub fn new(year: i32, total_cash_flow: Decimal) -> Self {
        Self { year, total_cash_flow }
    }
}

/// Equity contributed by each party at close (period 0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestedCapital {
    #[serde(with = "rust_decimal::serde::float", default)]
    pub gp: Decimal,
    #[serde(with = "rust_decimal::serde::float", default)]
    pub lp: Decimal,
}

impl InvestedCapital {
    pub fn new(gp: Decimal, lp: Decimal) -> Self {
        Self { gp, lp }
    }

    pub fn total(&self) -> Decimal {
        self.gp + self.lp
    }
}

/// Everything the engine needs from the projection side for one deal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowProjection {
    pub deal_id: String,
    pub initial_invested_capital: InvestedCapital,
    pub yearly_cash_flows: Vec<YearlyCashFlow>,
}

impl CashFlowProjection {
    pub fn new(
        deal_id: impl Into<String>,
        initial_invested_capital: InvestedCapital,
        yearly_cash_flows: Vec<YearlyCashFlow>,
    ) -> Self {
        Self {
            deal_id: deal_id.into(),
            initial_invested_capital,
            yearly_cash_flows,
        }
    }

    /// Sum of every year's net cash flow
    pub fn total_cash_flow(&self) -> Decimal {
        self.yearly_cash_flows.iter().map(|cf| cf.total_cash_flow).sum()
    }
}

/// Supplier of cash flow projections, consumed as a black box
pub trait CashFlowSource {
    fn projection(&self, deal_id: &str) -> Option<CashFlowProjection>;
}

/// Projections held in memory, keyed by deal
#[derive(Debug, Clone, Default)]
pub struct InMemoryCashFlowSource {
    projections: HashMap<String, CashFlowProjection>,
}

impl InMemoryCashFlowSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the projection for its deal
    pub fn insert(&mut self, projection: CashFlowProjection) {
        self.projections.insert(projection.deal_id.clone(), projection);
    }

    pub fn with_projection(mut self, projection: CashFlowProjection) -> Self {
        self.insert(projection);
        self
    }
}

impl CashFlowSource for InMemoryCashFlowSource {
    fn projection(&self, deal_id: &str) -> Option<CashFlowProjection> {
        self.projections.get(deal_id).cloned()
    }
}
