//! Behavioral properties of the waterfall, checked through the public API

use std::path::PathBuf;

use approx::assert_abs_diff_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use promote_waterfall::cashflow::load_cash_flows;
use promote_waterfall::structure::load_structures;
use promote_waterfall::waterfall::calculate_irr;
use promote_waterfall::{
    CashFlowProjection, EngineConfig, InvalidStructureError, InvestedCapital, PromoteStructure, SolverConfig,
    WaterfallCalculationResult, WaterfallEngine, WaterfallTier, YearlyCashFlow,
};

fn standard() -> PromoteStructure {
    PromoteStructure::new(
        "standard",
        "8% Pref / 20% Promote",
        "deal",
        vec![
            WaterfallTier::new(1, 8.0, 0.0, 100.0),
            WaterfallTier::new(2, f64::INFINITY, 20.0, 80.0),
        ],
    )
}

fn ladder() -> PromoteStructure {
    PromoteStructure::new(
        "ladder",
        "Four Tier Ladder",
        "deal",
        vec![
            WaterfallTier::new(1, 8.0, 10.0, 90.0),
            WaterfallTier::new(2, 12.0, 20.0, 80.0),
            WaterfallTier::new(3, 15.0, 30.0, 70.0),
            WaterfallTier::new(4, f64::INFINITY, 40.0, 60.0),
        ],
    )
}

/// Deterministic pseudo-random yearly series in cents
fn series(seed: u64, years: i32, allow_calls: bool) -> Vec<YearlyCashFlow> {
    let mut state = seed.max(1);
    (0..years)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let cents = (state % 250_000_000) as i64;
            let cents = if allow_calls && state % 5 == 0 { -cents / 4 } else { cents };
            YearlyCashFlow::new(2024 + i, Decimal::new(cents, 2))
        })
        .collect()
}

fn run(structure: &PromoteStructure, gp: Decimal, lp: Decimal, flows: Vec<YearlyCashFlow>) -> WaterfallCalculationResult {
    let projection = CashFlowProjection::new("deal", InvestedCapital::new(gp, lp), flows);
    WaterfallEngine::new(EngineConfig::default())
        .calculate(structure, &projection)
        .unwrap()
}

fn max_tier(result: &WaterfallCalculationResult, idx: usize) -> Option<u32> {
    result.yearly_distributions[idx].tier_allocations.iter().map(|a| a.tier_order).max()
}

fn min_tier(result: &WaterfallCalculationResult, idx: usize) -> Option<u32> {
    result.yearly_distributions[idx].tier_allocations.iter().map(|a| a.tier_order).min()
}

#[test]
fn every_year_is_split_exactly() {
    for seed in 1..=25u64 {
        for structure in [standard(), ladder()] {
            let result = run(&structure, dec!(100000), dec!(900000), series(seed, 12, true));

            for row in &result.yearly_distributions {
                assert_eq!(row.gp_distribution + row.lp_distribution, row.total_cash_flow);

                let allocated: Decimal = row.tier_allocations.iter().map(|a| a.amount).sum();
                if row.total_cash_flow > Decimal::ZERO {
                    assert_eq!(allocated, row.total_cash_flow);
                }
                for a in &row.tier_allocations {
                    assert_eq!(a.gp_amount + a.lp_amount, a.amount);
                }
            }
        }
    }
}

#[test]
fn cumulative_columns_are_running_sums() {
    let result = run(&ladder(), dec!(50000), dec!(950000), series(7, 15, true));

    let mut gp = Decimal::ZERO;
    let mut lp = Decimal::ZERO;
    let mut total = Decimal::ZERO;
    for row in &result.yearly_distributions {
        gp += row.gp_distribution;
        lp += row.lp_distribution;
        total += row.total_cash_flow;
        assert_eq!(row.cumulative_gp, gp);
        assert_eq!(row.cumulative_lp, lp);
        assert_eq!(row.cumulative_total, total);
    }

    assert_eq!(result.total_gp_distribution, gp);
    assert_eq!(result.total_lp_distribution, lp);
}

#[test]
fn splits_must_sum_to_one_hundred() {
    let structure = PromoteStructure::new("bad", "Bad", "deal", vec![WaterfallTier::new(1, 8.0, 60.0, 30.0)]);
    assert!(matches!(
        structure.validate(),
        Err(InvalidStructureError::SplitsDoNotSumTo100 { tier_order: 1, .. })
    ));
}

#[test]
fn tiers_never_step_back_without_capital_calls() {
    for seed in 1..=25u64 {
        let result = run(&ladder(), dec!(0), dec!(1000000), series(seed, 12, false));

        let mut highest = 0;
        for idx in 0..result.yearly_distributions.len() {
            if let Some(lowest_this_year) = min_tier(&result, idx) {
                assert!(lowest_this_year >= highest, "seed {} year index {}", seed, idx);
            }
            if let Some(top) = max_tier(&result, idx) {
                highest = top;
            }
        }
    }
}

#[test]
fn single_tier_splits_at_its_ratio() {
    let structure = PromoteStructure::new("flat", "Flat 30/70", "deal", vec![WaterfallTier::new(1, 0.0, 30.0, 70.0)]);
    let result = run(&structure, dec!(300), dec!(700), series(3, 10, false));

    for row in &result.yearly_distributions {
        let expected_gp = row.total_cash_flow * dec!(0.3);
        assert!((row.gp_distribution - expected_gp).abs() <= dec!(0.01));
        if !row.total_cash_flow.is_zero() {
            assert_abs_diff_eq!(row.gp_percentage, 30.0, epsilon = 1e-2);
        }
    }
}

#[test]
fn exit_year_spans_pref_and_promote() {
    let flows = vec![
        YearlyCashFlow::new(1, dec!(100000)),
        YearlyCashFlow::new(2, dec!(100000)),
        YearlyCashFlow::new(3, dec!(100000)),
        YearlyCashFlow::new(4, dec!(100000)),
        YearlyCashFlow::new(5, dec!(1500000)),
    ];
    let result = run(&standard(), dec!(0), dec!(1000000), flows);

    let exit = &result.yearly_distributions[4];
    let orders: Vec<u32> = exit.tier_allocations.iter().map(|a| a.tier_order).collect();
    assert_eq!(orders, vec![1, 2]);
    assert!(exit.gp_distribution < exit.total_cash_flow * dec!(0.2));
    assert!(exit.gp_distribution > Decimal::ZERO);

    // LP clears the 8% pref over the hold
    assert!(result.lp_irr.unwrap() > 8.0);
}

#[test]
fn zero_years_report_zero_percentages() {
    let flows = vec![YearlyCashFlow::new(1, dec!(0)), YearlyCashFlow::new(2, dec!(0))];
    let result = run(&standard(), dec!(0), dec!(1000), flows);

    for row in &result.yearly_distributions {
        assert_eq!(row.gp_percentage, 0.0);
        assert_eq!(row.lp_percentage, 0.0);
    }
}

#[test]
fn irr_of_ten_percent_return() {
    let irr = calculate_irr(&[-100.0, 110.0], &SolverConfig::default()).unwrap();
    assert_abs_diff_eq!(irr * 100.0, 10.0, epsilon = 1e-4);
}

#[test]
fn empty_projection_gives_empty_result() {
    let result = run(&ladder(), dec!(0), dec!(1000), Vec::new());

    assert!(result.yearly_distributions.is_empty());
    assert_eq!(result.total_gp_distribution, Decimal::ZERO);
    assert_eq!(result.total_lp_distribution, Decimal::ZERO);
    assert!(result.lp_irr.is_none());
}

#[test]
fn sample_data_runs_under_every_structure() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let structures = load_structures(root.join("data/structures.json")).unwrap();
    let flows = load_cash_flows(root.join("data/cash_flows.csv")).unwrap();
    assert!(!structures.is_empty());

    for structure in &structures {
        structure.validate().unwrap();
        let result = run(structure, dec!(1000000), dec!(9000000), flows.clone());

        assert_eq!(result.total_cash_flow(), flows.iter().map(|f| f.total_cash_flow).sum::<Decimal>());
        assert!(result.gp_irr.is_some());
        assert!(result.lp_irr.is_some());
        assert!(result.total_gp_distribution > Decimal::ZERO);
        assert!(result.lp_multiple > 1.0);
    }
}
