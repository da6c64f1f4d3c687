//! Merging the two aggregations into one unified gas model.
//!
//! The input shape is a sum type so the "neither trace present" path is
//! explicit and exhaustively handled instead of nullable fields threaded
//! through every function. `totalGasUsed` comes from the call trace when
//! present (it includes intrinsic gas the step log cannot see), else from
//! the step log; percentages are recomputed against that total.

use crate::aggregator::{CallTraceAggregation, StructLogAggregation};
use crate::model::schema::{CategoryTotal, ContractGasEntry};
use crate::parser::schema::{CallTrace, StructLogTrace};
use log::debug;

/// Which trace forms are available for an analysis run
#[derive(Debug, Clone, Copy)]
pub enum TraceInput<'a> {
    /// No trace data at all; produces the zero model
    Neither,
    /// Only the flat step log
    StructLogOnly(&'a StructLogTrace),
    /// Only the hierarchical call trace
    CallTraceOnly(&'a CallTrace),
    /// Both forms
    Both {
        struct_log: &'a StructLogTrace,
        call_trace: &'a CallTrace,
    },
}

impl<'a> TraceInput<'a> {
    /// Classify a pair of optional inputs
    pub fn from_parts(
        struct_log: Option<&'a StructLogTrace>,
        call_trace: Option<&'a CallTrace>,
    ) -> Self {
        match (struct_log, call_trace) {
            (None, None) => TraceInput::Neither,
            (Some(s), None) => TraceInput::StructLogOnly(s),
            (None, Some(c)) => TraceInput::CallTraceOnly(c),
            (Some(s), Some(c)) => TraceInput::Both {
                struct_log: s,
                call_trace: c,
            },
        }
    }

    pub fn struct_log(&self) -> Option<&'a StructLogTrace> {
        match self {
            TraceInput::StructLogOnly(s) | TraceInput::Both { struct_log: s, .. } => Some(s),
            _ => None,
        }
    }

    pub fn call_trace(&self) -> Option<&'a CallTrace> {
        match self {
            TraceInput::CallTraceOnly(c) | TraceInput::Both { call_trace: c, .. } => Some(c),
            _ => None,
        }
    }
}

/// The merged model every downstream consumer reads from.
///
/// Category keys and contract-address keys are disjoint namespaces sharing
/// the same percentage-of-total-gas semantics.
#[derive(Debug, Clone, Default)]
pub struct UnifiedGasModel {
    /// Total gas for the whole transaction
    pub total_gas_used: u64,

    /// Per-category breakdown, descending by gas, percentages against
    /// `total_gas_used`
    pub category_totals: Vec<CategoryTotal>,

    /// Per-contract attribution, descending by gas, percentages against
    /// `total_gas_used`
    pub contract_entries: Vec<ContractGasEntry>,

    /// Step-log aggregation, when a step log was supplied
    pub struct_log: Option<StructLogAggregation>,

    /// Call-trace aggregation, when a call trace was supplied
    pub call_trace: Option<CallTraceAggregation>,

    /// Warnings accumulated across aggregation
    pub warnings: Vec<String>,
}

/// Merge the aggregations into a unified model.
///
/// **Public** - runs after both aggregators complete
///
/// With neither aggregation present the result is the zero model: all
/// collections empty, total zero, not an error.
pub fn build_unified_model(
    struct_log: Option<StructLogAggregation>,
    call_trace: Option<CallTraceAggregation>,
) -> UnifiedGasModel {
    let total_gas_used = call_trace
        .as_ref()
        .map(|c| c.total_gas)
        .filter(|&gas| gas > 0)
        .or_else(|| struct_log.as_ref().map(|s| s.total_gas))
        .unwrap_or(0);

    debug!("Unified model total gas: {total_gas_used}");

    let mut category_totals = struct_log
        .as_ref()
        .map(|s| s.category_totals.clone())
        .unwrap_or_default();
    for total in &mut category_totals {
        total.percentage_of_total = percentage(total.gas_used, total_gas_used);
    }

    let mut contract_entries = call_trace
        .as_ref()
        .map(|c| c.contract_entries.clone())
        .unwrap_or_default();
    for entry in &mut contract_entries {
        entry.percentage_of_total = percentage(entry.gas_used, total_gas_used);
    }

    let warnings = call_trace
        .as_ref()
        .map(|c| c.warnings.clone())
        .unwrap_or_default();

    UnifiedGasModel {
        total_gas_used,
        category_totals,
        contract_entries,
        struct_log,
        call_trace,
        warnings,
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{aggregate_call_trace, aggregate_struct_log};
    use crate::parser::schema::{CallRecord, TraceStep};

    fn step(index: u64, opcode: &str, gas: u64) -> TraceStep {
        TraceStep {
            step: index,
            opcode: opcode.to_string(),
            gas_cost: gas,
            depth: 0,
            stack_depth: 0,
            memory_size_bytes: 0,
        }
    }

    fn root_call(gas: u64) -> CallRecord {
        CallRecord {
            id: "root".to_string(),
            parent_id: None,
            trace_address: Vec::new(),
            from: "0xcaller".to_string(),
            to: "0xcallee".to_string(),
            call_type: "CALL".to_string(),
            gas_used: gas,
            value_transferred: 0.0,
            success: true,
            error: None,
            contract_label: None,
            input_preview: None,
        }
    }

    #[test]
    fn test_neither_input_is_zero_model() {
        let model = build_unified_model(None, None);
        assert_eq!(model.total_gas_used, 0);
        assert!(model.category_totals.is_empty());
        assert!(model.contract_entries.is_empty());
    }

    #[test]
    fn test_total_prefers_call_trace() {
        let steps = StructLogTrace::from_steps(vec![step(0, "SSTORE", 20_000)]);
        let calls = CallTrace::from_records(vec![root_call(50_000)]);

        let model = build_unified_model(
            Some(aggregate_struct_log(&steps)),
            Some(aggregate_call_trace(&calls)),
        );

        assert_eq!(model.total_gas_used, 50_000);
        // Category percentages recomputed against the call-trace total
        assert_eq!(model.category_totals[0].percentage_of_total, 40.0);
        assert_eq!(model.contract_entries[0].percentage_of_total, 100.0);
    }

    #[test]
    fn test_total_falls_back_to_struct_log() {
        let steps = StructLogTrace::from_steps(vec![step(0, "ADD", 3), step(1, "SSTORE", 20_000)]);
        let model = build_unified_model(Some(aggregate_struct_log(&steps)), None);
        assert_eq!(model.total_gas_used, 20_003);

        let summed: f64 = model
            .category_totals
            .iter()
            .map(|c| c.percentage_of_total)
            .sum();
        assert!((summed - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_trace_input_classification() {
        let steps = StructLogTrace::default();
        let calls = CallTrace::default();

        assert!(matches!(
            TraceInput::from_parts(None, None),
            TraceInput::Neither
        ));
        assert!(matches!(
            TraceInput::from_parts(Some(&steps), None),
            TraceInput::StructLogOnly(_)
        ));
        assert!(matches!(
            TraceInput::from_parts(None, Some(&calls)),
            TraceInput::CallTraceOnly(_)
        ));
        assert!(matches!(
            TraceInput::from_parts(Some(&steps), Some(&calls)),
            TraceInput::Both { .. }
        ));
    }
}
