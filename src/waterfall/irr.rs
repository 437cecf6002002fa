//! Internal Rate of Return (IRR) calculation
//!
//! Used for each party's whole-hold IRR and for the LP's IRR-to-date.
//! Cash flows are annual: index 0 is the close, index `t` is `t` years later.

use crate::config::SolverConfig;

/// Calculate the annual IRR of a series of yearly cash flows
/// using Newton-Raphson, falling back to bisection.
///
/// # Arguments
/// * `cashflows` - Cash flows by year (positive = inflow, negative = outflow)
/// * `solver` - Iteration cap, NPV tolerance and search bracket
///
/// # Returns
/// * `Option<f64>` - Annual IRR as a decimal (e.g., 0.10 for 10%), or None if
///   the series has no sign change or no root was found inside the bracket
pub fn calculate_irr(cashflows: &[f64], solver: &SolverConfig) -> Option<f64> {
    if cashflows.is_empty() {
        return None;
    }

    if cashflows.iter().all(|&cf| cf.abs() < 1e-10) {
        return Some(0.0);
    }

    // At least one sign change is required for an IRR to exist
    let has_positive = cashflows.iter().any(|&cf| cf > 1e-10);
    let has_negative = cashflows.iter().any(|&cf| cf < -1e-10);
    if !has_positive || !has_negative {
        return None;
    }

    let scale = cashflows.iter().fold(1.0_f64, |acc, cf| acc.max(cf.abs()));
    let tolerance = solver.npv_tolerance * scale;

    let mut rate = 0.05_f64.clamp(solver.lower_bound, solver.upper_bound);

    for _ in 0..solver.max_iterations {
        let (npv, dnpv) = npv_and_derivative(cashflows, rate);

        if npv.abs() < tolerance {
            return Some(rate);
        }

        if dnpv.abs() < 1e-20 {
            break;
        }

        let new_rate = (rate - npv / dnpv).clamp(solver.lower_bound, solver.upper_bound);

        // Pinned against the bracket
        if (new_rate - rate).abs() < 1e-14 {
            break;
        }

        rate = new_rate;
    }

    calculate_irr_bisection(cashflows, solver, tolerance)
}

/// NPV and its derivative with respect to rate
fn npv_and_derivative(cashflows: &[f64], rate: f64) -> (f64, f64) {
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for (t, &cf) in cashflows.iter().enumerate() {
        let discount = (1.0 + rate).powi(t as i32);
        npv += cf / discount;
        if t > 0 {
            dnpv -= (t as f64) * cf / ((1.0 + rate).powi(t as i32 + 1));
        }
    }

    (npv, dnpv)
}

fn calculate_irr_bisection(cashflows: &[f64], solver: &SolverConfig, tolerance: f64) -> Option<f64> {
    let mut low = solver.lower_bound;
    let mut high = solver.upper_bound;

    let mut npv_low = npv_at_rate(cashflows, low);
    let npv_high = npv_at_rate(cashflows, high);

    // No root bracketed
    if npv_low * npv_high > 0.0 {
        return None;
    }

    for _ in 0..solver.max_iterations {
        let mid = (low + high) / 2.0;
        let npv_mid = npv_at_rate(cashflows, mid);

        if npv_mid.abs() < tolerance || (high - low) / 2.0 < 1e-12 {
            return Some(mid);
        }

        if npv_mid * npv_low < 0.0 {
            high = mid;
        } else {
            low = mid;
            npv_low = npv_mid;
        }
    }

    None
}

/// NPV at a given annual rate
pub fn npv_at_rate(cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}
