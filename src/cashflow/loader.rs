//! Load yearly cash flows from CSV
//!
//! Expected columns: `Year,TotalCashFlow`. Amounts are parsed as exact
//! decimals; thousands separators and a leading `$` are tolerated.

use super::YearlyCashFlow;
use rust_decimal::Decimal;
use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

/// Default location of the sample projection
pub const DEFAULT_CASH_FLOWS_PATH: &str = "data/cash_flows.csv";

/// Load yearly cash flows from a CSV file
pub fn load_cash_flows<P: AsRef<Path>>(path: P) -> Result<Vec<YearlyCashFlow>, Box<dyn Error>> {
    let file = File::open(path)?;
    load_cash_flows_from_reader(file)
}

/// Load yearly cash flows from any reader
pub fn load_cash_flows_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<YearlyCashFlow>, Box<dyn Error>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut flows = Vec::new();

    for (row, result) in csv_reader.records().enumerate() {
        let record = result?;
        let (Some(year), Some(amount)) = (record.get(0), record.get(1)) else {
            return Err(format!("Row {} needs Year and TotalCashFlow columns", row + 1).into());
        };
        let year: i32 = year.trim().parse()?;
        let total_cash_flow = parse_amount(amount)?;
        flows.push(YearlyCashFlow { year, total_cash_flow });
    }

    Ok(flows)
}

fn parse_amount(raw: &str) -> Result<Decimal, Box<dyn Error>> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '$')
        .collect();

    // Accounting negatives: (1,000) == -1000
    let amount = match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => -Decimal::from_str(inner)?,
        None => Decimal::from_str(&cleaned)?,
    };

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_cash_flows() {
        let data = "Year,TotalCashFlow\n\
                    2025,\"$100,000.00\"\n\
                    2026,(25000)\n\
                    2027,1500000.25\n";
        let flows = load_cash_flows_from_reader(data.as_bytes()).unwrap();

        assert_eq!(flows.len(), 3);
        assert_eq!(flows[0].year, 2025);
        assert_eq!(flows[0].total_cash_flow, dec!(100000));
        assert_eq!(flows[1].total_cash_flow, dec!(-25000));
        assert_eq!(flows[2].total_cash_flow, dec!(1500000.25));
    }

    #[test]
    fn test_bad_amount_is_an_error() {
        let data = "Year,TotalCashFlow\n1,lots\n";
        assert!(load_cash_flows_from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_amount_column_is_an_error() {
        let data = "Year\n2025\n";
        let err = load_cash_flows_from_reader(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Row 1"));
    }
}
