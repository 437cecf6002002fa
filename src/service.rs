//! Calculation service tying structures, projections and the engine together
//!
//! Looks up a deal's promote structures and cash flow projection, runs the
//! waterfall for one or every structure, and freezes the structure version
//! behind a result once the user saves it.

use log::info;
use rayon::prelude::*;

use crate::cashflow::CashFlowSource;
use crate::config::EngineConfig;
use crate::error::WaterfallError;
use crate::structure::{PromoteStructure, StructureStore};
use crate::waterfall::{WaterfallCalculationResult, WaterfallEngine};

/// Runs waterfalls against a structure store and a cash flow source
///
/// # Example
/// ```ignore
/// let service = CalculationService::new(store, source, EngineConfig::default());
/// let result = service.calculate("deal-1", "standard")?;
/// ```
#[derive(Debug)]
pub struct CalculationService<S, C> {
    store: S,
    source: C,
    engine: WaterfallEngine,
}

impl<S: StructureStore, C: CashFlowSource> CalculationService<S, C> {
    pub fn new(store: S, source: C, config: EngineConfig) -> Self {
        Self {
            store,
            source,
            engine: WaterfallEngine::new(config),
        }
    }

    /// Run one structure of a deal against the deal's projection
    pub fn calculate(&self, deal_id: &str, structure_id: &str) -> Result<WaterfallCalculationResult, WaterfallError> {
        let structure = self
            .store
            .get(structure_id)
            .ok_or_else(|| WaterfallError::StructureNotFound {
                deal_id: deal_id.to_string(),
                structure_id: structure_id.to_string(),
            })?;

        if structure.deal_id != deal_id {
            return Err(WaterfallError::DealMismatch {
                deal_id: deal_id.to_string(),
                structure_id: structure_id.to_string(),
                owner: structure.deal_id,
            });
        }

        self.run(deal_id, &structure)
    }

    /// Run one specific saved version of a structure
    pub fn calculate_version(
        &self,
        deal_id: &str,
        structure_id: &str,
        version: u32,
    ) -> Result<WaterfallCalculationResult, WaterfallError> {
        let structure = self
            .store
            .get_version(structure_id, version)
            .filter(|s| s.deal_id == deal_id)
            .ok_or_else(|| WaterfallError::StructureNotFound {
                deal_id: deal_id.to_string(),
                structure_id: structure_id.to_string(),
            })?;

        self.run(deal_id, &structure)
    }

    fn run(&self, deal_id: &str, structure: &PromoteStructure) -> Result<WaterfallCalculationResult, WaterfallError> {
        let projection = self
            .source
            .projection(deal_id)
            .ok_or_else(|| WaterfallError::ProjectionNotFound(deal_id.to_string()))?;

        let result = self.engine.calculate(structure, &projection)?;
        info!(
            "Calculated deal {} structure {} v{}: GP {} / LP {}",
            deal_id, structure.id, structure.version, result.total_gp_distribution, result.total_lp_distribution
        );
        Ok(result)
    }

    /// Freeze the structure version a result was computed with
    pub fn finalize(&mut self, result: &WaterfallCalculationResult) -> bool {
        let locked = self.store.finalize(&result.structure_id, result.structure_version);
        if locked {
            info!(
                "Finalized structure {} v{} for deal {}",
                result.structure_id, result.structure_version, result.deal_id
            );
        }
        locked
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn engine(&self) -> &WaterfallEngine {
        &self.engine
    }
}

impl<S, C> CalculationService<S, C>
where
    S: StructureStore + Sync,
    C: CashFlowSource + Sync,
{
    /// Run every structure of a deal, in parallel across structures.
    ///
    /// Results come back in structure id order, one entry per structure.
    pub fn calculate_deal(&self, deal_id: &str) -> Result<Vec<WaterfallCalculationResult>, WaterfallError> {
        let structures = self.store.list_for_deal(deal_id);
        let projection = self
            .source
            .projection(deal_id)
            .ok_or_else(|| WaterfallError::ProjectionNotFound(deal_id.to_string()))?;

        info!("Running {} structures for deal {}", structures.len(), deal_id);

        structures
            .par_iter()
            .map(|structure| self.engine.calculate(structure, &projection))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflow::{CashFlowProjection, InMemoryCashFlowSource, InvestedCapital, YearlyCashFlow};
    use crate::structure::{InMemoryStructureStore, WaterfallTier};
    use rust_decimal_macros::dec;

    fn structure(id: &str, deal: &str, promote: f64) -> PromoteStructure {
        PromoteStructure::new(
            id,
            id.to_uppercase(),
            deal,
            vec![
                WaterfallTier::new(1, 8.0, 0.0, 100.0),
                WaterfallTier::new(2, f64::INFINITY, promote, 100.0 - promote),
            ],
        )
    }

    fn service() -> CalculationService<InMemoryStructureStore, InMemoryCashFlowSource> {
        let store = InMemoryStructureStore::with_structures(vec![
            structure("aggressive", "deal-1", 30.0),
            structure("standard", "deal-1", 20.0),
            structure("other", "deal-2", 20.0),
        ])
        .unwrap();

        let source = InMemoryCashFlowSource::new().with_projection(CashFlowProjection::new(
            "deal-1",
            InvestedCapital::new(dec!(0), dec!(1000)),
            vec![YearlyCashFlow::new(1, dec!(100)), YearlyCashFlow::new(2, dec!(2000))],
        ));

        CalculationService::new(store, source, EngineConfig::default())
    }

    #[test]
    fn test_calculate_single_structure() {
        let result = service().calculate("deal-1", "standard").unwrap();
        assert_eq!(result.structure_id, "standard");
        assert_eq!(result.structure_version, 1);
        assert_eq!(result.yearly_distributions.len(), 2);
        assert_eq!(result.total_gp_distribution + result.total_lp_distribution, dec!(2100));
    }

    #[test]
    fn test_lookup_failures() {
        let service = service();

        assert!(matches!(
            service.calculate("deal-1", "missing"),
            Err(WaterfallError::StructureNotFound { .. })
        ));
        assert!(matches!(
            service.calculate("deal-1", "other"),
            Err(WaterfallError::DealMismatch { .. })
        ));
        assert!(matches!(
            service.calculate("deal-2", "other"),
            Err(WaterfallError::ProjectionNotFound(_))
        ));
    }

    #[test]
    fn test_calculate_deal_runs_every_structure() {
        let results = service().calculate_deal("deal-1").unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.structure_id.as_str()).collect();
        assert_eq!(ids, vec!["aggressive", "standard"]);

        // A bigger promote means more to the GP on the same cash
        assert!(results[0].total_gp_distribution > results[1].total_gp_distribution);
    }

    #[test]
    fn test_finalized_result_stays_reproducible() {
        let mut service = service();
        let first = service.calculate("deal-1", "standard").unwrap();
        assert!(service.finalize(&first));

        let edited = service.store_mut().save(structure("standard", "deal-1", 40.0)).unwrap();
        assert_eq!(edited.version, 2);

        let replay = service.calculate_version("deal-1", "standard", 1).unwrap();
        assert_eq!(replay.yearly_distributions, first.yearly_distributions);

        let latest = service.calculate("deal-1", "standard").unwrap();
        assert_eq!(latest.structure_version, 2);
        assert!(latest.total_gp_distribution > first.total_gp_distribution);
    }
}
