//! Promote Waterfall - GP/LP equity distribution engine for real estate deals
//!
//! This library provides:
//! - Promote structures with IRR-hurdle tiers, validation and versioning
//! - Yearly waterfall allocation of deal cash flows between GP and LP
//! - Per-party IRR and equity multiple
//! - A calculation service running every structure of a deal in parallel

pub mod cashflow;
pub mod config;
pub mod error;
pub mod metrics;
pub mod service;
pub mod structure;
pub mod waterfall;

// Re-export commonly used types
pub use cashflow::{CashFlowProjection, CashFlowSource, InMemoryCashFlowSource, InvestedCapital, YearlyCashFlow};
pub use config::{ConfigError, EngineConfig, SolverConfig};
pub use error::{InvalidStructureError, WaterfallError};
pub use metrics::{CalculationWarning, Party, PerformanceMetrics};
pub use service::CalculationService;
pub use structure::{InMemoryStructureStore, PromoteStructure, StructureStore, WaterfallTier};
pub use waterfall::{TierAllocation, WaterfallCalculationResult, WaterfallEngine, YearlyDistribution};
