//! Compare every promote structure of a deal side by side
//!
//! Usage: cargo run --bin compare_structures -- --lp-capital 9000000 --gp-capital 1000000

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use rust_decimal::Decimal;

use promote_waterfall::cashflow::load_cash_flows;
use promote_waterfall::cashflow::loader::DEFAULT_CASH_FLOWS_PATH;
use promote_waterfall::structure::load_structures;
use promote_waterfall::structure::loader::DEFAULT_STRUCTURES_PATH;
use promote_waterfall::{
    CalculationService, CashFlowProjection, EngineConfig, InMemoryCashFlowSource, InMemoryStructureStore,
    InvestedCapital,
};

#[derive(Debug, Parser)]
#[command(name = "compare_structures", about = "Run every promote structure of a deal over the same cash flows")]
struct Args {
    #[arg(long, default_value = DEFAULT_STRUCTURES_PATH)]
    structures: PathBuf,

    #[arg(long, default_value = DEFAULT_CASH_FLOWS_PATH)]
    cash_flows: PathBuf,

    /// Deal to compare; defaults to the deal of the first structure in the file
    #[arg(long)]
    deal_id: Option<String>,

    #[arg(long, default_value = "0")]
    gp_capital: Decimal,

    #[arg(long)]
    lp_capital: Decimal,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let start = Instant::now();

    let structures = load_structures(&args.structures)
        .map_err(|e| anyhow!("Failed to load structures from {}: {}", args.structures.display(), e))?;
    let deal_id = match args.deal_id {
        Some(id) => id,
        None => structures
            .first()
            .map(|s| s.deal_id.clone())
            .ok_or_else(|| anyhow!("No structures in {}", args.structures.display()))?,
    };

    let cash_flows = load_cash_flows(&args.cash_flows)
        .map_err(|e| anyhow!("Failed to load cash flows from {}: {}", args.cash_flows.display(), e))?;

    let store = InMemoryStructureStore::with_structures(structures).context("Invalid structure in file")?;
    let source = InMemoryCashFlowSource::new().with_projection(CashFlowProjection::new(
        deal_id.clone(),
        InvestedCapital::new(args.gp_capital, args.lp_capital),
        cash_flows,
    ));

    let config = EngineConfig::from_env().context("Invalid WATERFALL_* environment configuration")?;
    let service = CalculationService::new(store, source, config);
    let results = service.calculate_deal(&deal_id)?;

    println!("Deal {}: {} structures in {:?}\n", deal_id, results.len(), start.elapsed());
    println!(
        "{:<20} {:>4} {:>16} {:>16} {:>8} {:>9} {:>9} {:>7} {:>7}",
        "Structure", "Ver", "GP Total", "LP Total", "GP %", "GP IRR", "LP IRR", "GP x", "LP x"
    );
    println!("{}", "-".repeat(104));

    for result in &results {
        println!(
            "{:<20} {:>4} {:>16.2} {:>16.2} {:>8.2} {:>9} {:>9} {:>7.2} {:>7.2}",
            result.structure_name,
            result.structure_version,
            result.total_gp_distribution,
            result.total_lp_distribution,
            result.gp_share_of_total(),
            format_irr(result.gp_irr),
            format_irr(result.lp_irr),
            result.gp_multiple,
            result.lp_multiple,
        );
    }

    Ok(())
}

fn format_irr(irr: Option<f64>) -> String {
    irr.map(|r| format!("{:.2}%", r)).unwrap_or_else(|| "n/a".to_string())
}
