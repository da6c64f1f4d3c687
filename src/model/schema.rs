//! Derived output schema for analysis results.
//!
//! Everything here is plain serializable data: the analysis result crosses
//! into export and bookmark subsystems, so no live references or handles.
//! Schema is versioned to allow future evolution.

use crate::categorizer::OpcodeCategory;
use serde::{Deserialize, Serialize};

/// Gas attributed to one opcode category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// Category this total belongs to
    pub category: OpcodeCategory,

    /// Display label for the category
    pub label: String,

    /// Chart color for the category (hex)
    pub color: String,

    /// Gas attributed to this category
    pub gas_used: u64,

    /// Number of steps that contributed
    pub count: u64,

    /// Share of total gas, 0-100. Recomputed whenever the reference total
    /// changes; never carried over from a previous total.
    pub percentage_of_total: f64,
}

/// Gas attributed to one contract address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractGasEntry {
    /// Contract account address
    pub address: String,

    /// Human-readable name when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Gas attributed to calls into this contract
    pub gas_used: u64,

    /// Number of calls into this contract
    pub call_count: u64,

    /// Share of total gas, 0-100
    pub percentage_of_total: f64,

    /// Successful calls / total calls, 0-100
    pub success_rate: f64,
}

/// One point of the cumulative gas timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub step: u64,
    pub gas_used: u64,
    pub cumulative_gas: u64,
}

/// One point of the stack/memory usage series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryPoint {
    pub step: u64,
    pub stack_depth: u32,
    pub memory_size_bytes: u64,
}

/// One point of the gas-intensity heatmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub step: u64,
    pub opcode: String,
    /// Gas cost relative to the most expensive step, 0-1
    pub intensity: f64,
}

/// Aggregated gas and count for one opcode mnemonic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpcodeTotal {
    pub opcode: String,
    pub count: u64,
    pub gas_used: u64,
}

/// The single most gas-expensive step of the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpensiveStep {
    pub opcode: String,
    pub gas_cost: u64,
    pub step: u64,
}

/// Performance metrics derived from the step log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepPerformance {
    /// Average gas per step
    pub avg_gas_per_step: f64,

    /// Most expensive step (ties broken by first occurrence)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_expensive: Option<ExpensiveStep>,

    /// Average operand-stack depth
    pub avg_stack_depth: f64,

    /// Peak operand-stack depth
    pub max_stack_depth: u32,

    /// Average memory footprint in bytes
    pub avg_memory_bytes: f64,

    /// Peak memory footprint in bytes
    pub max_memory_bytes: u64,

    /// Bounded score: max(0, 100 - (avg_gas_per_step / 1000) * 100)
    pub efficiency_score: f64,
}

/// One node of the reconstructed call forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallNode {
    pub id: String,
    pub from: String,
    pub to: String,
    pub call_type: String,
    pub gas_used: u64,
    pub value_transferred: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_preview: Option<String>,
    pub trace_address: Vec<u32>,
    pub children: Vec<CallNode>,
}

/// A nonzero value movement, for the transfer list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTransfer {
    pub from: String,
    pub to: String,
    pub call_type: String,
    pub value: f64,
}

/// The most frequently called contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MostCalledContract {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub call_count: u64,
}

/// Summary of contract-interaction patterns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionSummary {
    /// Number of distinct callee contracts
    pub unique_contracts: u64,

    /// Most-called contract (ties broken by first encountered)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_called: Option<MostCalledContract>,

    /// Average call depth (traceAddress length)
    pub avg_call_depth: f64,

    /// Number of failed calls
    pub failed_calls: u64,

    /// Failed calls / total calls, 0-100
    pub failure_rate: f64,

    /// Detection signal: unique_contracts * avg_call_depth + failed_calls
    pub complexity_score: f64,
}

/// Severity of an optimization finding, ordered low to critical
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Implementation difficulty of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One actionable suggestion attached to a finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: String,
    pub difficulty: Difficulty,
}

/// One measured quantity that contributed to a detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceMetric {
    pub name: String,
    pub observed: f64,
    pub threshold: f64,
}

/// The specific counts and thresholds that triggered a detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEvidence {
    pub summary: String,
    pub metrics: Vec<EvidenceMetric>,
}

/// Estimated savings of a finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialSavings {
    /// Gas that could be saved
    pub gas_amount: u64,

    /// Saved gas as a share of total gas, 0-100
    pub percentage: f64,

    /// USD value of the saved gas at the configured pricing
    pub cost_estimate_usd: f64,
}

/// A detected inefficiency pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationFinding {
    pub pattern_id: String,
    pub category: OpcodeCategory,
    pub severity: Severity,
    pub potential_savings: PotentialSavings,
    pub evidence: PatternEvidence,
    pub recommendations: Vec<Recommendation>,
}

/// One efficiency metric with its benchmark and bounded score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyMetric {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub benchmark: f64,
    /// Always within [0, 100]
    pub score: f64,
}

/// Cost estimate for one gas-consuming entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub label: String,
    pub gas_used: u64,
    pub cost_native: f64,
    pub cost_usd: f64,
}

/// The complete analysis result handed to the presentation layer.
///
/// This is the contract consumed by charts, export, and bookmarks; it is
/// fully recomputed on every analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedAnalysisResult {
    /// Schema version for compatibility checking
    pub version: String,

    /// Timestamp when the analysis was generated
    pub generated_at: String,

    /// Total gas used by the transaction
    pub total_gas_used: u64,

    /// Per-category gas breakdown, descending by gas
    pub gas_breakdown: Vec<CategoryTotal>,

    /// Per-contract gas attribution, descending by gas
    pub contract_attribution: Vec<ContractGasEntry>,

    /// Efficiency metric set, overall score first
    pub efficiency_metrics: Vec<EfficiencyMetric>,

    /// Cost estimates for the top gas consumers, descending by USD cost
    pub cost_analysis: Vec<CostEntry>,

    /// Detected optimization findings, ranked by potential savings
    pub optimization_findings: Vec<OptimizationFinding>,

    /// Reconstructed call forest (multiple roots possible)
    pub call_hierarchy: Vec<CallNode>,

    /// Cumulative gas timeline, one point per step
    pub execution_timeline: Vec<TimelinePoint>,

    /// Gas-intensity heatmap, one point per step
    pub heatmap: Vec<HeatmapPoint>,

    /// Stack/memory usage series
    pub memory_usage: Vec<MemoryPoint>,

    /// Nonzero value movements, descending by value
    pub value_transfers: Vec<ValueTransfer>,

    /// Step-log performance metrics (absent without a step log)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<StepPerformance>,

    /// Interaction-pattern summary (absent without a call trace)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction: Option<InteractionSummary>,

    /// Recoverable data-integrity warnings encountered during analysis
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
