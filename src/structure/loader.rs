//! Load promote structures from JSON and tier tables from CSV

use super::{PromoteStructure, WaterfallTier};
use csv::Reader;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Default location of the structures file
pub const DEFAULT_STRUCTURES_PATH: &str = "data/structures.json";

/// Raw CSV row of a tier table
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "TierOrder")]
    tier_order: u32,
    #[serde(rename = "Hurdle")]
    hurdle: String,
    #[serde(rename = "GpSplit")]
    gp_split: f64,
    #[serde(rename = "LpSplit")]
    lp_split: f64,
}

impl CsvRow {
    fn to_tier(self) -> Result<WaterfallTier, Box<dyn Error>> {
        let hurdle = match self.hurdle.trim() {
            "" | "Inf" | "inf" | "None" => f64::INFINITY,
            other => other
                .trim_end_matches('%')
                .parse::<f64>()
                .map_err(|e| format!("Bad hurdle {:?} in tier {}: {}", other, self.tier_order, e))?,
        };

        Ok(WaterfallTier {
            tier_order: self.tier_order,
            hurdle,
            gp_split: self.gp_split,
            lp_split: self.lp_split,
        })
    }
}

/// Load a tier table from a CSV file
pub fn load_tiers<P: AsRef<Path>>(path: P) -> Result<Vec<WaterfallTier>, Box<dyn Error>> {
    load_tiers_from_reader(File::open(path)?)
}

/// Load a tier table from any reader
pub fn load_tiers_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<WaterfallTier>, Box<dyn Error>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut tiers = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        tiers.push(row.to_tier()?);
    }

    Ok(tiers)
}

/// Load every structure in a JSON array file
pub fn load_structures<P: AsRef<Path>>(path: P) -> Result<Vec<PromoteStructure>, Box<dyn Error>> {
    let file = File::open(path)?;
    load_structures_from_reader(BufReader::new(file))
}

/// Load structures from any reader holding a JSON array
pub fn load_structures_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<PromoteStructure>, Box<dyn Error>> {
    let structures: Vec<PromoteStructure> = serde_json::from_reader(reader)?;
    Ok(structures)
}
