//! Input data model for the two trace forms.
//!
//! These types mirror what geth-style tracers emit: a flat per-opcode step
//! log and a hierarchical per-call trace. Field names accept the camelCase
//! spellings used on the wire. Instances are read-only to the engine; all
//! derived structures are allocated fresh by the aggregators.

use serde::{Deserialize, Serialize};

/// One opcode execution from the flat step log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStep {
    /// Sequence index, unique and monotonically increasing
    pub step: u64,

    /// Opcode mnemonic (e.g., "SSTORE")
    #[serde(alias = "op")]
    pub opcode: String,

    /// Gas cost of this step
    #[serde(default)]
    pub gas_cost: u64,

    /// Call-stack depth at this step
    #[serde(default)]
    pub depth: u32,

    /// Operand-stack depth at this step
    #[serde(default)]
    pub stack_depth: u32,

    /// Memory size in bytes at this step
    #[serde(default)]
    pub memory_size_bytes: u64,
}

/// Summary statistics for a step log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructLogSummary {
    pub total_steps: u64,
    pub total_gas_cost: u64,
    pub max_stack_depth: u32,
}

/// A parsed flat step log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructLogTrace {
    pub steps: Vec<TraceStep>,
    pub summary: StructLogSummary,
}

impl StructLogTrace {
    /// Build a trace from validated steps, computing the summary block
    pub fn from_steps(steps: Vec<TraceStep>) -> Self {
        let summary = StructLogSummary {
            total_steps: steps.len() as u64,
            total_gas_cost: steps.iter().map(|s| s.gas_cost).sum(),
            max_stack_depth: steps.iter().map(|s| s.stack_depth).max().unwrap_or(0),
        };
        Self { steps, summary }
    }
}

/// One call frame from the hierarchical call trace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    /// Unique identifier for this frame
    pub id: String,

    /// Id of the parent frame, if any (roots have none)
    #[serde(default)]
    pub parent_id: Option<String>,

    /// Path of child indices locating this call in the tree;
    /// empty for the root call
    #[serde(default)]
    pub trace_address: Vec<u32>,

    /// Caller account address
    #[serde(default)]
    pub from: String,

    /// Callee account address
    #[serde(default)]
    pub to: String,

    /// Call type: CALL, DELEGATECALL, STATICCALL, CREATE, ...
    #[serde(default = "default_call_type", rename = "type")]
    pub call_type: String,

    /// Gas consumed by this frame
    #[serde(default)]
    pub gas_used: u64,

    /// Value moved by this call, in native-currency units
    #[serde(default)]
    pub value_transferred: f64,

    /// Whether the call succeeded; false iff an error string is present
    #[serde(default = "default_success")]
    pub success: bool,

    /// Error string for failed calls
    #[serde(default)]
    pub error: Option<String>,

    /// Optional human-readable contract name
    #[serde(default)]
    pub contract_label: Option<String>,

    /// Optional decoded function signature or name
    #[serde(default)]
    pub input_preview: Option<String>,
}

fn default_call_type() -> String {
    "CALL".to_string()
}

fn default_success() -> bool {
    true
}

impl CallRecord {
    /// Display label: contract label when known, else the callee address
    pub fn display_label(&self) -> &str {
        self.contract_label.as_deref().unwrap_or(&self.to)
    }
}

/// Transaction-level statistics for a call trace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStats {
    pub total_calls: u64,
    pub total_gas: u64,
    pub errors: u64,
}

/// A parsed hierarchical call trace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallTrace {
    pub call_data: Vec<CallRecord>,
    pub transaction_stats: TransactionStats,
}

impl CallTrace {
    /// Build a trace from validated records, computing transaction stats.
    ///
    /// Total gas is the sum over root frames (their gasUsed already
    /// includes nested calls); if the trace has no root, all frames are
    /// summed as a fallback.
    pub fn from_records(call_data: Vec<CallRecord>) -> Self {
        let root_gas: u64 = call_data
            .iter()
            .filter(|r| r.trace_address.is_empty())
            .map(|r| r.gas_used)
            .sum();
        let total_gas = if root_gas > 0 || call_data.iter().any(|r| r.trace_address.is_empty()) {
            root_gas
        } else {
            call_data.iter().map(|r| r.gas_used).sum()
        };

        let transaction_stats = TransactionStats {
            total_calls: call_data.len() as u64,
            total_gas,
            errors: call_data.iter().filter(|r| !r.success).count() as u64,
        };
        Self {
            call_data,
            transaction_stats,
        }
    }
}
