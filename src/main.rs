//! Promote Waterfall CLI
//!
//! Runs one promote structure over a yearly cash flow CSV and prints the
//! GP/LP split per year plus the whole-hold metrics.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use rust_decimal::Decimal;

use promote_waterfall::cashflow::loader::DEFAULT_CASH_FLOWS_PATH;
use promote_waterfall::cashflow::load_cash_flows;
use promote_waterfall::structure::loader::DEFAULT_STRUCTURES_PATH;
use promote_waterfall::structure::load_structures;
use promote_waterfall::{CashFlowProjection, EngineConfig, InvestedCapital, WaterfallCalculationResult, WaterfallEngine};

#[derive(Debug, Parser)]
#[command(name = "waterfall", version, about = "Split deal cash flows between GP and LP under a promote structure")]
struct Args {
    /// JSON file of promote structures
    #[arg(long, default_value = DEFAULT_STRUCTURES_PATH)]
    structures: PathBuf,

    /// Structure to run; may be omitted when the file holds only one
    #[arg(long)]
    structure_id: Option<String>,

    /// CSV of yearly cash flows (Year,TotalCashFlow)
    #[arg(long, default_value = DEFAULT_CASH_FLOWS_PATH)]
    cash_flows: PathBuf,

    /// GP capital contributed at close
    #[arg(long, default_value = "0")]
    gp_capital: Decimal,

    /// LP capital contributed at close
    #[arg(long)]
    lp_capital: Decimal,

    /// Where to write the yearly distribution CSV
    #[arg(long, default_value = "waterfall_output.csv")]
    output: PathBuf,

    /// Print the full result as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = EngineConfig::from_env().context("Invalid WATERFALL_* environment configuration")?;

    let structures = load_structures(&args.structures)
        .map_err(|e| anyhow!("Failed to load structures from {}: {}", args.structures.display(), e))?;

    let structure = match &args.structure_id {
        Some(id) => structures
            .iter()
            .find(|s| &s.id == id)
            .ok_or_else(|| anyhow!("Structure {} not found in {}", id, args.structures.display()))?,
        None if structures.len() == 1 => &structures[0],
        None => bail!(
            "{} structures in {}; pick one with --structure-id ({})",
            structures.len(),
            args.structures.display(),
            structures.iter().map(|s| s.id.as_str()).collect::<Vec<_>>().join(", ")
        ),
    };

    let cash_flows = load_cash_flows(&args.cash_flows)
        .map_err(|e| anyhow!("Failed to load cash flows from {}: {}", args.cash_flows.display(), e))?;

    let projection = CashFlowProjection::new(
        structure.deal_id.clone(),
        InvestedCapital::new(args.gp_capital, args.lp_capital),
        cash_flows,
    );

    let engine = WaterfallEngine::new(config);
    let result = engine.calculate(structure, &projection)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_table(&result);
    }

    write_csv(&args.output, &result)
        .with_context(|| format!("Unable to write {}", args.output.display()))?;
    if !args.json {
        println!("\nFull results written to: {}", args.output.display());
    }

    Ok(())
}

fn print_table(result: &WaterfallCalculationResult) {
    println!("Promote Waterfall v{}", env!("CARGO_PKG_VERSION"));
    println!("======================\n");
    println!(
        "Deal: {}  Structure: {} ({} v{})",
        result.deal_id, result.structure_id, result.structure_name, result.structure_version
    );
    println!();

    println!(
        "{:>6} {:>16} {:>14} {:>14} {:>16} {:>16} {:>7} {:>7} {:>9}",
        "Year", "Cash Flow", "GP", "LP", "Cum GP", "Cum LP", "GP %", "LP %", "LP IRR"
    );
    println!("{}", "-".repeat(114));

    for row in &result.yearly_distributions {
        println!(
            "{:>6} {:>16.2} {:>14.2} {:>14.2} {:>16.2} {:>16.2} {:>7.2} {:>7.2} {:>9}",
            row.year,
            row.total_cash_flow,
            row.gp_distribution,
            row.lp_distribution,
            row.cumulative_gp,
            row.cumulative_lp,
            row.gp_percentage,
            row.lp_percentage,
            format_irr(row.lp_irr_to_date),
        );
    }

    println!("\nSummary:");
    println!("  Total Cash Flow: ${:.2}", result.total_cash_flow());
    println!(
        "  GP: ${:.2} ({:.2}% of total)  IRR {}  Multiple {:.2}x",
        result.total_gp_distribution,
        result.gp_share_of_total(),
        format_irr(result.gp_irr),
        result.gp_multiple
    );
    println!(
        "  LP: ${:.2}  IRR {}  Multiple {:.2}x",
        result.total_lp_distribution,
        format_irr(result.lp_irr),
        result.lp_multiple
    );

    for warning in &result.warnings {
        println!("  Warning: {:?}", warning);
    }
}

fn format_irr(irr: Option<f64>) -> String {
    irr.map(|r| format!("{:.2}%", r)).unwrap_or_else(|| "n/a".to_string())
}

fn write_csv(path: &Path, result: &WaterfallCalculationResult) -> std::io::Result<()> {
    let mut file = File::create(path)?;

    writeln!(
        file,
        "Year,CashFlow,GP,LP,CumulativeGP,CumulativeLP,CumulativeTotal,GPPct,LPPct,LPIrrToDate"
    )?;

    for row in &result.yearly_distributions {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{:.6},{:.6},{}",
            row.year,
            row.total_cash_flow,
            row.gp_distribution,
            row.lp_distribution,
            row.cumulative_gp,
            row.cumulative_lp,
            row.cumulative_total,
            row.gp_percentage,
            row.lp_percentage,
            row.lp_irr_to_date.map(|r| format!("{:.6}", r)).unwrap_or_default(),
        )?;
    }

    Ok(())
}
