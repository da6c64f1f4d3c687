//! Unified gas model: derived data structures and the merge step.
//!
//! `schema` defines every derived structure the engine produces (the
//! serializable contract consumed by presentation, export, and bookmark
//! subsystems). `unified` merges the two aggregations into one model.

pub mod schema;
pub mod unified;

// Re-export main types
pub use schema::{
    CategoryTotal, ContractGasEntry, CostEntry, EfficiencyMetric, OptimizationFinding,
    PotentialSavings, Recommendation, Severity, UnifiedAnalysisResult,
};
pub use unified::{build_unified_model, TraceInput, UnifiedGasModel};
