//! Promote structure model, loaders and repository

mod data;
pub mod loader;
mod store;

pub use data::{PromoteStructure, WaterfallTier, SPLIT_TOLERANCE};
pub use loader::{load_structures, load_structures_from_reader, load_tiers, load_tiers_from_reader};
pub use store::{InMemoryStructureStore, StructureStore};
