//! Struct-log aggregation.
//!
//! Consumes the flat step log and produces per-category gas totals, the
//! cumulative gas timeline, the stack/memory usage series, the
//! gas-intensity heatmap, and step-level performance metrics. A single
//! left-to-right pass over the steps; empty input yields all-zero/empty
//! outputs, never an error.

use crate::categorizer::{categorize, OpcodeCategory};
use crate::model::schema::{
    CategoryTotal, ExpensiveStep, HeatmapPoint, MemoryPoint, OpcodeTotal, StepPerformance,
    TimelinePoint,
};
use crate::parser::schema::StructLogTrace;
use crate::utils::config::STEP_EFFICIENCY_DIVISOR;
use log::debug;
use std::collections::HashMap;

/// Everything derived from the step log
#[derive(Debug, Clone, Default)]
pub struct StructLogAggregation {
    /// Per-category gas totals, descending by gas
    pub category_totals: Vec<CategoryTotal>,

    /// Per-opcode gas totals, descending by gas
    pub opcode_totals: Vec<OpcodeTotal>,

    /// Cumulative gas timeline, one point per step
    pub execution_timeline: Vec<TimelinePoint>,

    /// Stack/memory usage series, one point per step
    pub memory_usage: Vec<MemoryPoint>,

    /// Gas-intensity heatmap, one point per step
    pub gas_heatmap: Vec<HeatmapPoint>,

    /// Step-level performance metrics
    pub performance: StepPerformance,

    /// Sum of all step gas costs
    pub total_gas: u64,

    /// Number of steps processed
    pub step_count: u64,
}

/// Aggregate a validated step log.
///
/// **Public** - main entry point for struct-log aggregation
pub fn aggregate_struct_log(trace: &StructLogTrace) -> StructLogAggregation {
    let steps = &trace.steps;
    debug!("Aggregating {} execution steps", steps.len());

    let total_gas: u64 = steps.iter().map(|s| s.gas_cost).sum();
    let max_gas = steps.iter().map(|s| s.gas_cost).max().unwrap_or(0);

    // Single pass: group by category and opcode, build the three series
    let mut by_category: HashMap<OpcodeCategory, (u64, u64)> = HashMap::new();
    let mut by_opcode: HashMap<String, (u64, u64)> = HashMap::new();
    let mut execution_timeline = Vec::with_capacity(steps.len());
    let mut memory_usage = Vec::with_capacity(steps.len());
    let mut gas_heatmap = Vec::with_capacity(steps.len());
    let mut cumulative_gas: u64 = 0;

    for step in steps {
        let entry = by_category.entry(categorize(&step.opcode)).or_insert((0, 0));
        entry.0 += step.gas_cost;
        entry.1 += 1;

        let op_entry = by_opcode
            .entry(step.opcode.to_ascii_uppercase())
            .or_insert((0, 0));
        op_entry.0 += step.gas_cost;
        op_entry.1 += 1;

        cumulative_gas += step.gas_cost;
        execution_timeline.push(TimelinePoint {
            step: step.step,
            gas_used: step.gas_cost,
            cumulative_gas,
        });

        memory_usage.push(MemoryPoint {
            step: step.step,
            stack_depth: step.stack_depth,
            memory_size_bytes: step.memory_size_bytes,
        });

        let intensity = if max_gas > 0 {
            step.gas_cost as f64 / max_gas as f64
        } else {
            0.0
        };
        gas_heatmap.push(HeatmapPoint {
            step: step.step,
            opcode: step.opcode.clone(),
            intensity,
        });
    }

    let category_totals = build_category_totals(by_category, total_gas);
    let opcode_totals = build_opcode_totals(by_opcode);
    let performance = build_performance(trace);

    StructLogAggregation {
        category_totals,
        opcode_totals,
        execution_timeline,
        memory_usage,
        gas_heatmap,
        performance,
        total_gas,
        step_count: steps.len() as u64,
    }
}

/// Turn the category groups into an ordered breakdown.
///
/// Percentages are computed against the step-gas total here and recomputed
/// by the model builder when the unified total differs.
fn build_category_totals(
    by_category: HashMap<OpcodeCategory, (u64, u64)>,
    total_gas: u64,
) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, (gas_used, count))| CategoryTotal {
            category,
            label: category.label().to_string(),
            color: category.chart_color().to_string(),
            gas_used,
            count,
            percentage_of_total: percentage(gas_used, total_gas),
        })
        .collect();

    // Descending by gas; category order breaks ties deterministically
    totals.sort_by(|a, b| b.gas_used.cmp(&a.gas_used).then(a.category.cmp(&b.category)));
    totals
}

fn build_opcode_totals(by_opcode: HashMap<String, (u64, u64)>) -> Vec<OpcodeTotal> {
    let mut totals: Vec<OpcodeTotal> = by_opcode
        .into_iter()
        .map(|(opcode, (gas_used, count))| OpcodeTotal {
            opcode,
            count,
            gas_used,
        })
        .collect();

    totals.sort_by(|a, b| b.gas_used.cmp(&a.gas_used).then(a.opcode.cmp(&b.opcode)));
    totals
}

fn build_performance(trace: &StructLogTrace) -> StepPerformance {
    let steps = &trace.steps;
    if steps.is_empty() {
        return StepPerformance::default();
    }

    let count = steps.len() as f64;
    let total_gas: u64 = steps.iter().map(|s| s.gas_cost).sum();
    let avg_gas_per_step = total_gas as f64 / count;

    // Strict comparison keeps the first occurrence on ties
    let mut most_expensive: Option<ExpensiveStep> = None;
    for step in steps {
        let beats = most_expensive
            .as_ref()
            .map(|m| step.gas_cost > m.gas_cost)
            .unwrap_or(true);
        if beats {
            most_expensive = Some(ExpensiveStep {
                opcode: step.opcode.clone(),
                gas_cost: step.gas_cost,
                step: step.step,
            });
        }
    }

    let avg_stack_depth = steps.iter().map(|s| s.stack_depth as f64).sum::<f64>() / count;
    let max_stack_depth = steps.iter().map(|s| s.stack_depth).max().unwrap_or(0);
    let avg_memory_bytes = steps.iter().map(|s| s.memory_size_bytes as f64).sum::<f64>() / count;
    let max_memory_bytes = steps.iter().map(|s| s.memory_size_bytes).max().unwrap_or(0);

    let efficiency_score =
        (100.0 - (avg_gas_per_step / STEP_EFFICIENCY_DIVISOR) * 100.0).max(0.0);

    StepPerformance {
        avg_gas_per_step,
        most_expensive,
        avg_stack_depth,
        max_stack_depth,
        avg_memory_bytes,
        max_memory_bytes,
        efficiency_score,
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
    use crate::parser::schema::TraceStep;

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

    #[test]
    fn test_category_totals_partition_gas() {
        let trace = StructLogTrace::from_steps(vec![
            step(0, "SSTORE", 20_000),
            step(1, "SSTORE", 20_000),
            step(2, "ADD", 3),
        ]);
        let agg = aggregate_struct_log(&trace);

        assert_eq!(agg.total_gas, 40_003);
        let summed: u64 = agg.category_totals.iter().map(|c| c.gas_used).sum();
        assert_eq!(summed, 40_003);

        let storage = &agg.category_totals[0];
        assert_eq!(storage.category, OpcodeCategory::Storage);
        assert_eq!(storage.gas_used, 40_000);
        assert_eq!(storage.count, 2);
        assert!((storage.percentage_of_total - 99.9925).abs() < 0.001);

        let computation = &agg.category_totals[1];
        assert_eq!(computation.category, OpcodeCategory::Computation);
        assert_eq!(computation.gas_used, 3);
        assert!((computation.percentage_of_total - 0.0075).abs() < 0.001);
    }

    #[test]
    fn test_timeline_is_prefix_sum() {
        let trace = StructLogTrace::from_steps(vec![
            step(0, "PUSH1", 3),
            step(1, "MLOAD", 6),
            step(2, "SSTORE", 20_000),
        ]);
        let agg = aggregate_struct_log(&trace);

        assert_eq!(agg.execution_timeline.len(), 3);
        assert_eq!(agg.execution_timeline[0].cumulative_gas, 3);
        assert_eq!(agg.execution_timeline[1].cumulative_gas, 9);
        assert_eq!(agg.execution_timeline[2].cumulative_gas, 20_009);
    }

    #[test]
    fn test_heatmap_intensity_scaled_by_max() {
        let trace = StructLogTrace::from_steps(vec![step(0, "ADD", 5), step(1, "SSTORE", 20)]);
        let agg = aggregate_struct_log(&trace);

        assert_eq!(agg.gas_heatmap[0].intensity, 0.25);
        assert_eq!(agg.gas_heatmap[1].intensity, 1.0);
    }

    #[test]
    fn test_heatmap_all_zero_gas() {
        let trace = StructLogTrace::from_steps(vec![step(0, "JUMPDEST", 0), step(1, "STOP", 0)]);
        let agg = aggregate_struct_log(&trace);

        assert!(agg.gas_heatmap.iter().all(|p| p.intensity == 0.0));
        assert!(agg
            .category_totals
            .iter()
            .all(|c| c.percentage_of_total == 0.0));
    }

    #[test]
    fn test_most_expensive_tie_keeps_first() {
        let trace = StructLogTrace::from_steps(vec![
            step(0, "MLOAD", 3),
            step(1, "SLOAD", 2_100),
            step(2, "SLOAD", 2_100),
        ]);
        let agg = aggregate_struct_log(&trace);

        let top = agg.performance.most_expensive.unwrap();
        assert_eq!(top.step, 1);
        assert_eq!(top.gas_cost, 2_100);
    }

    #[test]
    fn test_efficiency_score_bounded() {
        // avg 5000 gas/step would go negative without the floor
        let trace = StructLogTrace::from_steps(vec![step(0, "SSTORE", 5_000)]);
        let agg = aggregate_struct_log(&trace);
        assert_eq!(agg.performance.efficiency_score, 0.0);

        let cheap = StructLogTrace::from_steps(vec![step(0, "ADD", 3)]);
        let agg = aggregate_struct_log(&cheap);
        assert!((agg.performance.efficiency_score - 99.7).abs() < 0.001);
    }

    #[test]
    fn test_empty_input_yields_empty_outputs() {
        let agg = aggregate_struct_log(&StructLogTrace::default());
        assert_eq!(agg.total_gas, 0);
        assert!(agg.category_totals.is_empty());
        assert!(agg.execution_timeline.is_empty());
        assert!(agg.gas_heatmap.is_empty());
        assert_eq!(agg.performance.avg_gas_per_step, 0.0);
    }
}
