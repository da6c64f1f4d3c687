//! Efficiency scoring against fixed benchmarks.
//!
//! Every metric carries `{value, unit, benchmark, score}` with the score
//! clamped to [0, 100]. A zero denominator (no calls, no steps, no memory)
//! yields the sentinel score 100 - "no evidence of inefficiency" - never
//! NaN or Infinity.

use crate::model::schema::EfficiencyMetric;
use crate::model::unified::UnifiedGasModel;
use crate::utils::config::{
    GAS_PER_CALL_BENCHMARK, GAS_PER_OPCODE_BENCHMARK, MEMORY_REFERENCE_UNITS, NO_EVIDENCE_SCORE,
    SUCCESS_RATE_BENCHMARK,
};

/// Compute the fixed efficiency metric set.
///
/// **Public** - consumes the unified model
///
/// Returns the metrics with the overall score (unweighted mean) prepended.
pub fn score_efficiency(model: &UnifiedGasModel) -> Vec<EfficiencyMetric> {
    let gas_per_call = gas_per_call_metric(model);
    let success_rate = success_rate_metric(model);
    let gas_per_opcode = gas_per_opcode_metric(model);
    let memory = memory_efficiency_metric(model);

    let individual = vec![gas_per_call, success_rate, gas_per_opcode, memory];
    let overall_score =
        individual.iter().map(|m| m.score).sum::<f64>() / individual.len() as f64;

    let mut metrics = Vec::with_capacity(individual.len() + 1);
    metrics.push(EfficiencyMetric {
        name: "Overall Efficiency".to_string(),
        value: overall_score,
        unit: "score".to_string(),
        benchmark: 100.0,
        score: clamp_score(overall_score),
    });
    metrics.extend(individual);
    metrics
}

fn gas_per_call_metric(model: &UnifiedGasModel) -> EfficiencyMetric {
    let call_count = model.call_trace.as_ref().map(|c| c.call_count).unwrap_or(0);
    let actual = if call_count > 0 {
        model.total_gas_used as f64 / call_count as f64
    } else {
        0.0
    };

    EfficiencyMetric {
        name: "Gas per Call".to_string(),
        value: actual,
        unit: "gas/call".to_string(),
        benchmark: GAS_PER_CALL_BENCHMARK,
        score: inverse_ratio_score(GAS_PER_CALL_BENCHMARK, actual),
    }
}

fn success_rate_metric(model: &UnifiedGasModel) -> EfficiencyMetric {
    let (rate, has_calls) = match model.call_trace.as_ref() {
        Some(agg) if agg.call_count > 0 => (100.0 - agg.interaction.failure_rate, true),
        _ => (0.0, false),
    };

    EfficiencyMetric {
        name: "Call Success Rate".to_string(),
        value: rate,
        unit: "%".to_string(),
        benchmark: SUCCESS_RATE_BENCHMARK,
        score: if has_calls {
            clamp_score(rate)
        } else {
            NO_EVIDENCE_SCORE
        },
    }
}

fn gas_per_opcode_metric(model: &UnifiedGasModel) -> EfficiencyMetric {
    let (step_gas, step_count) = model
        .struct_log
        .as_ref()
        .map(|s| (s.total_gas, s.step_count))
        .unwrap_or((0, 0));
    let actual = if step_count > 0 {
        step_gas as f64 / step_count as f64
    } else {
        0.0
    };

    EfficiencyMetric {
        name: "Gas per Opcode".to_string(),
        value: actual,
        unit: "gas/op".to_string(),
        benchmark: GAS_PER_OPCODE_BENCHMARK,
        score: inverse_ratio_score(GAS_PER_OPCODE_BENCHMARK, actual),
    }
}

fn memory_efficiency_metric(model: &UnifiedGasModel) -> EfficiencyMetric {
    let peak = model
        .struct_log
        .as_ref()
        .map(|s| s.performance.max_memory_bytes)
        .unwrap_or(0);

    EfficiencyMetric {
        name: "Memory Efficiency".to_string(),
        value: peak as f64,
        unit: "bytes".to_string(),
        benchmark: MEMORY_REFERENCE_UNITS,
        score: inverse_ratio_score(MEMORY_REFERENCE_UNITS, peak as f64),
    }
}

/// Score a "lower is better" value: benchmark/actual, capped at 100.
/// Zero actual means no evidence of inefficiency.
fn inverse_ratio_score(benchmark: f64, actual: f64) -> f64 {
    if actual <= 0.0 {
        NO_EVIDENCE_SCORE
    } else {
        clamp_score((benchmark / actual) * 100.0)
    }
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}
