//! Core waterfall engine: yearly GP/LP allocation across promote tiers

use log::debug;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use super::distributions::{percentage_of, TierAllocation, WaterfallCalculationResult, YearlyDistribution};
use super::irr::calculate_irr;
use super::state::WaterfallState;
use crate::cashflow::{CashFlowProjection, InvestedCapital};
use crate::config::EngineConfig;
use crate::error::{InvalidStructureError, WaterfallError};
use crate::metrics::{self, party_cash_flows, period_of, Party};
use crate::structure::{PromoteStructure, WaterfallTier};

/// Minimum decimal places kept on allocated amounts (cents)
pub const MONEY_SCALE: u32 = 2;

/// Longest hold, first year to last year inclusive, the engine accepts
pub const MAX_HOLD_YEARS: i64 = 200;

/// Main waterfall engine
#[derive(Debug, Clone, Default)]
pub struct WaterfallEngine {
    config: EngineConfig,
}

impl WaterfallEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the waterfall for one structure over one projection.
    ///
    /// The structure and the series are checked before any year is
    /// processed; a failure returns no partial result. Years are processed
    /// strictly in order since each year's tier depends on every prior
    /// distribution.
    pub fn calculate(
        &self,
        structure: &PromoteStructure,
        projection: &CashFlowProjection,
    ) -> Result<WaterfallCalculationResult, WaterfallError> {
        structure.validate()?;
        validate_projection(projection)?;
        let top = structure.top_tier().ok_or(InvalidStructureError::NoTiers)?;

        let capital = projection.initial_invested_capital;
        let mut state = WaterfallState::new(structure, &capital);
        let mut yearly: Vec<YearlyDistribution> = Vec::with_capacity(projection.yearly_cash_flows.len());

        let first_year = projection.yearly_cash_flows.first().map(|cf| cf.year).unwrap_or_default();

        for cash_flow in &projection.yearly_cash_flows {
            state.advance_to(period_of(cash_flow.year, first_year));

            let amount = cash_flow.total_cash_flow;
            let (gp_amount, lp_amount, tier_allocations) = if amount.is_sign_positive() && !amount.is_zero() {
                allocate_distribution(amount, structure, top, &mut state)
            } else if amount.is_sign_negative() && !amount.is_zero() {
                let (gp_call, lp_call) = split_capital_call(-amount, structure, &state);
                state.record_capital_call(gp_call, lp_call);
                (-gp_call, -lp_call, Vec::new())
            } else {
                (Decimal::ZERO, Decimal::ZERO, Vec::new())
            };

            state.record_year(gp_amount, lp_amount);

            if tier_allocations.len() > 1 {
                debug!(
                    "Year {}: distribution crossed tiers {:?}",
                    cash_flow.year,
                    tier_allocations.iter().map(|a| a.tier_order).collect::<Vec<_>>()
                );
            }
            debug!(
                "Year {}: total={} gp={} lp={} cumulative_lp={}",
                cash_flow.year, amount, gp_amount, lp_amount, state.cumulative_lp
            );

            yearly.push(YearlyDistribution {
                year: cash_flow.year,
                total_cash_flow: amount,
                gp_distribution: gp_amount,
                lp_distribution: lp_amount,
                cumulative_gp: state.cumulative_gp,
                cumulative_lp: state.cumulative_lp,
                cumulative_total: state.cumulative_total,
                gp_percentage: percentage_of(gp_amount, amount),
                lp_percentage: percentage_of(lp_amount, amount),
                tier_allocations,
                lp_irr_to_date: None,
            });

            if self.config.track_lp_irr {
                let lp_irr = self.lp_irr_to_date(&yearly, &capital);
                if let Some(row) = yearly.last_mut() {
                    row.lp_irr_to_date = lp_irr;
                }
            }
        }

        let summary = metrics::summarize(&yearly, &capital, &self.config.solver);

        Ok(WaterfallCalculationResult::new(
            projection.deal_id.clone(),
            structure.id.clone(),
            structure.name.clone(),
            structure.version,
            yearly,
            summary,
        ))
    }

    fn lp_irr_to_date(&self, yearly: &[YearlyDistribution], capital: &InvestedCapital) -> Option<f64> {
        let flows = party_cash_flows(yearly, capital.lp, Party::Lp);
        calculate_irr(&flows, &self.config.solver).map(|r| r * 100.0)
    }
}

fn validate_projection(projection: &CashFlowProjection) -> Result<(), WaterfallError> {
    let capital = projection.initial_invested_capital;
    if capital.gp.is_sign_negative() && !capital.gp.is_zero() {
        return Err(WaterfallError::NegativeInvestedCapital { party: Party::Gp });
    }
    if capital.lp.is_sign_negative() && !capital.lp.is_zero() {
        return Err(WaterfallError::NegativeInvestedCapital { party: Party::Lp });
    }

    for pair in projection.yearly_cash_flows.windows(2) {
        if pair[1].year <= pair[0].year {
            return Err(WaterfallError::YearsNotIncreasing {
                previous: pair[0].year,
                year: pair[1].year,
            });
        }
    }

    if let (Some(first), Some(last)) = (projection.yearly_cash_flows.first(), projection.yearly_cash_flows.last()) {
        if i64::from(last.year) - i64::from(first.year) + 1 > MAX_HOLD_YEARS {
            return Err(WaterfallError::HoldTooLong {
                first_year: first.year,
                last_year: last.year,
                max_years: MAX_HOLD_YEARS,
            });
        }
    }

    Ok(())
}

/// Split a positive distribution across tiers.
///
/// Cash goes out under the lowest tier whose hurdle the LP has not met, but
/// only up to the amount that meets it; the remainder is re-evaluated
/// against the next tier. Once every hurdle is met the last tier takes the
/// rest. Returns the GP total, LP total and per-tier chunks, where the
/// totals add to `amount` exactly.
fn allocate_distribution(
    amount: Decimal,
    structure: &PromoteStructure,
    top: &WaterfallTier,
    state: &mut WaterfallState,
) -> (Decimal, Decimal, Vec<TierAllocation>) {
    let scale = amount.scale().max(MONEY_SCALE);

    let mut remaining = amount;
    let mut allocations: Vec<TierAllocation> = Vec::new();

    for _ in 0..=structure.tiers.len() {
        if remaining <= Decimal::ZERO {
            break;
        }

        let unsatisfied = state.first_unsatisfied_tier();
        let tier = match unsatisfied {
            Some(idx) => &structure.tiers[idx],
            None => top,
        };
        let lp_fraction = split_fraction(tier.lp_split);

        // Cash that would bring the LP exactly to this tier's hurdle
        let capacity = match unsatisfied {
            Some(idx) if !lp_fraction.is_zero() => state.hurdle_accounts[idx]
                .lp_shortfall()
                .and_then(|shortfall| shortfall.checked_div(lp_fraction))
                .map(|cash| cash.round_dp(scale)),
            _ => None,
        };

        let chunk = match capacity {
            Some(cash) if cash < remaining => cash,
            _ => remaining,
        };

        let (gp_part, lp_part) = split_chunk(chunk, lp_fraction, scale);
        state.record_lp_distribution(lp_part);
        push_allocation(&mut allocations, tier, chunk, gp_part, lp_part);
        remaining -= chunk;
    }

    // Every pass either exhausts the cash or clears a tier, so this only
    // catches rounding dust.
    if remaining > Decimal::ZERO {
        let (gp_part, lp_part) = split_chunk(remaining, split_fraction(top.lp_split), scale);
        state.record_lp_distribution(lp_part);
        push_allocation(&mut allocations, top, remaining, gp_part, lp_part);
    }

    let lp_total: Decimal = allocations.iter().map(|a| a.lp_amount).sum();
    let gp_total = amount - lp_total;

    (gp_total, lp_total, allocations)
}

/// LP share of a chunk rounded to `scale`, GP takes the exact remainder
fn split_chunk(chunk: Decimal, lp_fraction: Decimal, scale: u32) -> (Decimal, Decimal) {
    let lp_part = (chunk * lp_fraction).round_dp(scale).min(chunk);
    (chunk - lp_part, lp_part)
}

fn push_allocation(
    allocations: &mut Vec<TierAllocation>,
    tier: &WaterfallTier,
    amount: Decimal,
    gp_amount: Decimal,
    lp_amount: Decimal,
) {
    match allocations.last_mut() {
        Some(prev) if prev.tier_order == tier.tier_order => {
            prev.amount += amount;
            prev.gp_amount += gp_amount;
            prev.lp_amount += lp_amount;
        }
        _ => allocations.push(TierAllocation {
            tier_order: tier.tier_order,
            amount,
            gp_amount,
            lp_amount,
        }),
    }
}

/// Fund a capital call pro rata to capital contributed so far; with no
/// capital in yet, the first tier's split decides.
fn split_capital_call(call: Decimal, structure: &PromoteStructure, state: &WaterfallState) -> (Decimal, Decimal) {
    let scale = call.scale().max(MONEY_SCALE);
    let gp_share = state
        .gp_capital_share()
        .unwrap_or_else(|| split_fraction(structure.tiers[0].gp_split));

    let gp_call = (call * gp_share).round_dp(scale).min(call);
    (gp_call, call - gp_call)
}

/// Percent split to a fraction of one
fn split_fraction(percent: f64) -> Decimal {
    Decimal::from_f64(percent).unwrap_or_default() / Decimal::ONE_HUNDRED
}
