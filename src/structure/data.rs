//! Promote structure data types matching the deal modeler's tier format

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InvalidStructureError;

/// Allowed drift when checking that a tier's splits add to 100%
pub const SPLIT_TOLERANCE: f64 = 1e-6;

/// A single return tier of a promote structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallTier {
    /// 1-based position of the tier within its structure
    pub tier_order: u32,

    /// Annualized LP IRR threshold in percent (8.0 = 8%).
    /// `f64::INFINITY` marks an open-ended top tier.
    #[serde(with = "open_hurdle", default = "unbounded")]
    pub hurdle: f64,

    /// Share of the tier's cash going to the GP, in percent
    pub gp_split: f64,

    /// Share of the tier's cash going to the LP, in percent
    pub lp_split: f64,
}

fn unbounded() -> f64 {
    f64::INFINITY
}

impl WaterfallTier {
    pub fn new(tier_order: u32, hurdle: f64, gp_split: f64, lp_split: f64) -> Self {
        Self { tier_order, hurdle, gp_split, lp_split }
    }

    /// Whether the tier runs without an upper return threshold
    pub fn is_open_ended(&self) -> bool {
        self.hurdle.is_infinite()
    }
}

/// Named, ordered list of tiers attached to a deal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoteStructure {
    pub id: String,
    pub name: String,
    pub deal_id: String,

    /// Bumped by the repository whenever a finalized structure is edited
    #[serde(default = "first_version")]
    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    pub tiers: Vec<WaterfallTier>,
}

fn first_version() -> u32 {
    1
}

impl PromoteStructure {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        deal_id: impl Into<String>,
        tiers: Vec<WaterfallTier>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            deal_id: deal_id.into(),
            version: first_version(),
            created_at: None,
            tiers,
        }
    }

    /// Check the tier contract.
    ///
    /// Rejects empty tier lists, splits that do not add to 100, tier orders
    /// that are duplicated or skip a number, and hurdles that do not strictly
    /// increase with tier order.
    pub fn validate(&self) -> Result<(), InvalidStructureError> {
        if self.tiers.is_empty() {
            return Err(InvalidStructureError::NoTiers);
        }

        for tier in &self.tiers {
            for split in [tier.gp_split, tier.lp_split] {
                if !split.is_finite() || !(0.0..=100.0).contains(&split) {
                    return Err(InvalidStructureError::SplitOutOfRange {
                        tier_order: tier.tier_order,
                        split,
                    });
                }
            }

            if (tier.gp_split + tier.lp_split - 100.0).abs() > SPLIT_TOLERANCE {
                return Err(InvalidStructureError::SplitsDoNotSumTo100 {
                    tier_order: tier.tier_order,
                    gp_split: tier.gp_split,
                    lp_split: tier.lp_split,
                });
            }

            if tier.hurdle.is_nan() || tier.hurdle <= -100.0 {
                return Err(InvalidStructureError::InvalidHurdle {
                    tier_order: tier.tier_order,
                    hurdle: tier.hurdle,
                });
            }
        }

        let mut seen = std::collections::HashSet::new();
        for tier in &self.tiers {
            if !seen.insert(tier.tier_order) {
                return Err(InvalidStructureError::DuplicateTierOrder {
                    tier_order: tier.tier_order,
                });
            }
        }

        for (idx, tier) in self.tiers.iter().enumerate() {
            let expected = idx as u32 + 1;
            if tier.tier_order != expected {
                return Err(InvalidStructureError::TierOrderNotSequential {
                    expected,
                    found: tier.tier_order,
                });
            }
        }

        for pair in self.tiers.windows(2) {
            if pair[1].hurdle <= pair[0].hurdle {
                return Err(InvalidStructureError::HurdleNotIncreasing {
                    tier_order: pair[1].tier_order,
                    hurdle: pair[1].hurdle,
                    previous: pair[0].hurdle,
                });
            }
        }

        Ok(())
    }

    /// Tier applying once every hurdle has been cleared
    pub fn top_tier(&self) -> Option<&WaterfallTier> {
        self.tiers.last()
    }
}

/// JSON cannot carry infinity, so an open-ended hurdle travels as `null`
mod open_hurdle {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hurdle: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if hurdle.is_finite() {
            serializer.serialize_some(hurdle)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
