//! Versioned repository of promote structures
//!
//! A structure version referenced by a finalized calculation is frozen.
//! Saving over a frozen version appends a new version instead, so every
//! saved calculation can be reproduced from the version it names.

use std::collections::HashMap;

use chrono::Utc;
use log::{debug, info};

use super::PromoteStructure;
use crate::error::InvalidStructureError;

/// Persistence seam for promote structures, owned by the surrounding application
pub trait StructureStore {
    /// Latest version of a structure
    fn get(&self, structure_id: &str) -> Option<PromoteStructure>;

    /// A specific version of a structure
    fn get_version(&self, structure_id: &str, version: u32) -> Option<PromoteStructure>;

    /// Latest version of every structure owned by a deal
    fn list_for_deal(&self, deal_id: &str) -> Vec<PromoteStructure>;

    /// Validate and store a structure, returning the version actually stored
    fn save(&mut self, structure: PromoteStructure) -> Result<PromoteStructure, InvalidStructureError>;

    /// Freeze a version; returns false if it does not exist
    fn finalize(&mut self, structure_id: &str, version: u32) -> bool;

    /// Drop every structure of a deal; returns how many structures were removed
    fn remove_deal(&mut self, deal_id: &str) -> usize;
}

#[derive(Debug, Clone)]
struct StoredVersion {
    structure: PromoteStructure,
    finalized: bool,
}

/// In-memory store, the default for the CLI, Lambda handler and tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryStructureStore {
    versions: HashMap<String, Vec<StoredVersion>>,
}

impl InMemoryStructureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from already-loaded structures
    pub fn with_structures(structures: Vec<PromoteStructure>) -> Result<Self, InvalidStructureError> {
        let mut store = Self::new();
        for structure in structures {
            store.save(structure)?;
        }
        Ok(store)
    }

    /// Number of versions kept for a structure
    pub fn version_count(&self, structure_id: &str) -> usize {
        self.versions.get(structure_id).map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_finalized(&self, structure_id: &str, version: u32) -> bool {
        self.versions
            .get(structure_id)
            .and_then(|history| history.iter().find(|v| v.structure.version == version))
            .map(|v| v.finalized)
            .unwrap_or(false)
    }
}

impl StructureStore for InMemoryStructureStore {
    fn get(&self, structure_id: &str) -> Option<PromoteStructure> {
        self.versions
            .get(structure_id)
            .and_then(|history| history.last())
            .map(|v| v.structure.clone())
    }

    fn get_version(&self, structure_id: &str, version: u32) -> Option<PromoteStructure> {
        self.versions
            .get(structure_id)?
            .iter()
            .find(|v| v.structure.version == version)
            .map(|v| v.structure.clone())
    }

    fn list_for_deal(&self, deal_id: &str) -> Vec<PromoteStructure> {
        let mut structures: Vec<PromoteStructure> = self
            .versions
            .values()
            .filter_map(|history| history.last())
            .filter(|v| v.structure.deal_id == deal_id)
            .map(|v| v.structure.clone())
            .collect();
        structures.sort_by(|a, b| a.id.cmp(&b.id));
        structures
    }

    fn save(&mut self, mut structure: PromoteStructure) -> Result<PromoteStructure, InvalidStructureError> {
        structure.validate()?;

        let owner = self
            .versions
            .get(&structure.id)
            .and_then(|history| history.first())
            .map(|v| v.structure.deal_id.as_str());
        if let Some(owner) = owner {
            if owner != structure.deal_id {
                return Err(InvalidStructureError::OwnedByAnotherDeal {
                    structure_id: structure.id.clone(),
                    owner: owner.to_string(),
                    deal_id: structure.deal_id.clone(),
                });
            }
        }

        structure.created_at = Some(Utc::now());

        let history = self.versions.entry(structure.id.clone()).or_default();
        match history.last().map(|v| (v.structure.version, v.finalized)) {
            None => {
                structure.version = 1;
                history.push(StoredVersion { structure: structure.clone(), finalized: false });
            }
            Some((latest_version, true)) => {
                structure.version = latest_version + 1;
                info!(
                    "Structure {} v{} is finalized, saving edit as v{}",
                    structure.id, latest_version, structure.version
                );
                history.push(StoredVersion { structure: structure.clone(), finalized: false });
            }
            Some((latest_version, false)) => {
                structure.version = latest_version;
                debug!("Replacing draft structure {} v{}", structure.id, structure.version);
                if let Some(latest) = history.last_mut() {
                    latest.structure = structure.clone();
                }
            }
        }

        Ok(structure)
    }

    fn finalize(&mut self, structure_id: &str, version: u32) -> bool {
        let stored = self
            .versions
            .get_mut(structure_id)
            .and_then(|history| history.iter_mut().find(|v| v.structure.version == version));

        match stored {
            Some(v) => {
                v.finalized = true;
                true
            }
            None => false,
        }
    }

    fn remove_deal(&mut self, deal_id: &str) -> usize {
        let before = self.versions.len();
        self.versions
            .retain(|_, history| history.first().map(|v| v.structure.deal_id != deal_id).unwrap_or(false));
        before - self.versions.len()
    }
}
