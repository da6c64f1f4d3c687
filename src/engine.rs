//! The analysis pipeline.
//!
//! One pure pass from validated traces to a complete analysis result:
//! aggregate, merge, score, price, detect. Stateless per invocation; the
//! two aggregators have no data dependency and run on scoped threads when
//! both inputs are present. That join is the only parallelism boundary -
//! hierarchy reconstruction itself needs a single consistent index.

use crate::aggregator::{aggregate_call_trace, aggregate_struct_log};
use crate::analysis::cost::{estimate_costs, PricingConfig};
use crate::analysis::efficiency::score_efficiency;
use crate::analysis::patterns::{default_patterns, detect_patterns, PatternDef};
use crate::model::schema::UnifiedAnalysisResult;
use crate::model::unified::{build_unified_model, TraceInput};
use crate::utils::config::SCHEMA_VERSION;
use chrono::Utc;
use log::{debug, info};
use std::thread;

/// Run the full analysis pipeline with the built-in pattern table
///
/// **Public** - convenience entry point
pub fn analyze(input: TraceInput<'_>, pricing: &PricingConfig) -> UnifiedAnalysisResult {
    analyze_with_patterns(input, pricing, default_patterns())
}

/// Run the full analysis pipeline with an injected pattern table.
///
/// **Public** - main entry point
///
/// Inputs are borrowed read-only; every derived structure in the result is
/// freshly allocated. Degenerate input (`Neither`, empty traces) produces
/// the zero result, not an error.
pub fn analyze_with_patterns(
    input: TraceInput<'_>,
    pricing: &PricingConfig,
    patterns: &[PatternDef],
) -> UnifiedAnalysisResult {
    let (struct_agg, call_agg) = match input {
        TraceInput::Neither => (None, None),
        TraceInput::StructLogOnly(s) => (Some(aggregate_struct_log(s)), None),
        TraceInput::CallTraceOnly(c) => (None, Some(aggregate_call_trace(c))),
        TraceInput::Both {
            struct_log,
            call_trace,
        } => thread::scope(|scope| {
            debug!("Running both aggregators in parallel");
            let steps = scope.spawn(|| aggregate_struct_log(struct_log));
            let calls = aggregate_call_trace(call_trace);
            let steps = steps
                .join()
                .expect("struct-log aggregation thread panicked");
            (Some(steps), Some(calls))
        }),
    };

    let model = build_unified_model(struct_agg, call_agg);
    info!(
        "Unified model: {} gas, {} categories, {} contracts",
        model.total_gas_used,
        model.category_totals.len(),
        model.contract_entries.len()
    );

    let efficiency_metrics = score_efficiency(&model);
    let cost_analysis = estimate_costs(&model, pricing);
    let optimization_findings = detect_patterns(&model, patterns, pricing);

    // Move the per-trace series out of the model into the flat result
    let (execution_timeline, heatmap, memory_usage, performance) = model
        .struct_log
        .map(|s| {
            (
                s.execution_timeline,
                s.gas_heatmap,
                s.memory_usage,
                Some(s.performance),
            )
        })
        .unwrap_or_default();

    let (call_hierarchy, value_transfers, interaction) = model
        .call_trace
        .map(|c| (c.call_hierarchy, c.value_transfers, Some(c.interaction)))
        .unwrap_or_default();

    UnifiedAnalysisResult {
        version: SCHEMA_VERSION.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        total_gas_used: model.total_gas_used,
        gas_breakdown: model.category_totals,
        contract_attribution: model.contract_entries,
        efficiency_metrics,
        cost_analysis,
        optimization_findings,
        call_hierarchy,
        execution_timeline,
        heatmap,
        memory_usage,
        value_transfers,
        performance,
        interaction,
        warnings: model.warnings,
    }
}
