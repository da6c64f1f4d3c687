//! Rule-based optimization pattern detection.
//!
//! The detector walks an immutable table of pattern definitions. Each
//! pattern gates on total gas, runs a predicate over the unified
//! aggregates, and estimates savings as
//! `min(static_estimate, observed_gas * SAVINGS_CAPTURE_FACTOR)`.
//! Given identical inputs the output list and its ordering are always
//! identical: no randomness, no wall-clock dependence.
//!
//! The default table is passed in by callers rather than read from a
//! global, so tests can inject their own definitions.

use crate::analysis::cost::PricingConfig;
use crate::categorizer::OpcodeCategory;
use crate::model::schema::{
    Difficulty, EvidenceMetric, OptimizationFinding, PatternEvidence, PotentialSavings, Severity,
};
use crate::model::unified::UnifiedGasModel;
use crate::utils::config::SAVINGS_CAPTURE_FACTOR;
use log::debug;

// Detection thresholds. Empirically chosen; kept as named constants so
// they can be tuned without touching detection logic.
pub const STORAGE_PACKING_MIN_TOTAL_GAS: u64 = 10_000;
pub const STORAGE_PACKING_MIN_WRITES: u64 = 3;
pub const STORAGE_PACKING_MIN_WRITE_GAS: u64 = 15_000;
pub const STORAGE_PACKING_STATIC_SAVINGS: u64 = 15_000;

pub const DATA_STRUCTURE_MIN_TOTAL_GAS: u64 = 40_000;
pub const DATA_STRUCTURE_MIN_READS: u64 = 20;
pub const DATA_STRUCTURE_MIN_READ_GAS: u64 = 10_000;
pub const DATA_STRUCTURE_STATIC_SAVINGS: u64 = 10_000;

pub const LOOP_MIN_TOTAL_GAS: u64 = 50_000;
pub const LOOP_MIN_BRANCHES: u64 = 100;
pub const LOOP_MIN_CONTROL_GAS: u64 = 5_000;
pub const LOOP_MIN_COMPLEXITY: f64 = 25.0;
pub const LOOP_MIN_REPEAT_CALLS: u64 = 10;
pub const LOOP_STATIC_SAVINGS: u64 = 25_000;

pub const MEMORY_MIN_TOTAL_GAS: u64 = 30_000;
pub const MEMORY_MIN_PEAK_BYTES: u64 = 10_000;
pub const MEMORY_MIN_CATEGORY_GAS: u64 = 15_000;
pub const MEMORY_STATIC_SAVINGS: u64 = 8_000;

pub const COMPUTE_MIN_TOTAL_GAS: u64 = 30_000;
pub const COMPUTE_MIN_HASHES: u64 = 10;
pub const COMPUTE_MIN_EXPS: u64 = 5;
pub const COMPUTE_STATIC_SAVINGS: u64 = 5_000;

pub const VISIBILITY_MIN_TOTAL_GAS: u64 = 21_000;
pub const VISIBILITY_MIN_COPIES: u64 = 5;
pub const VISIBILITY_MIN_MEMORY_GAS: u64 = 2_000;
pub const VISIBILITY_STATIC_SAVINGS: u64 = 2_000;

/// Read-only view over the unified model for predicates
pub struct PatternContext<'a> {
    model: &'a UnifiedGasModel,
}

impl<'a> PatternContext<'a> {
    pub fn new(model: &'a UnifiedGasModel) -> Self {
        Self { model }
    }

    pub fn total_gas(&self) -> u64 {
        self.model.total_gas_used
    }

    /// Gas attributed to a category (0 without a step log)
    pub fn category_gas(&self, category: OpcodeCategory) -> u64 {
        self.model
            .category_totals
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.gas_used)
            .unwrap_or(0)
    }

    /// Count and gas for one opcode mnemonic (zeros without a step log)
    pub fn opcode_stats(&self, opcode: &str) -> (u64, u64) {
        self.model
            .struct_log
            .as_ref()
            .and_then(|s| s.opcode_totals.iter().find(|o| o.opcode == opcode))
            .map(|o| (o.count, o.gas_used))
            .unwrap_or((0, 0))
    }

    pub fn max_memory_bytes(&self) -> u64 {
        self.model
            .struct_log
            .as_ref()
            .map(|s| s.performance.max_memory_bytes)
            .unwrap_or(0)
    }

    pub fn complexity_score(&self) -> f64 {
        self.model
            .call_trace
            .as_ref()
            .map(|c| c.interaction.complexity_score)
            .unwrap_or(0.0)
    }

    /// Call count and attributed gas of the most-called contract
    pub fn most_called(&self) -> Option<(u64, u64)> {
        let agg = self.model.call_trace.as_ref()?;
        let most = agg.interaction.most_called.as_ref()?;
        let gas = agg
            .contract_entries
            .iter()
            .find(|e| e.address == most.address)
            .map(|e| e.gas_used)
            .unwrap_or(0);
        Some((most.call_count, gas))
    }
}

/// A successful detection: what was observed, and the gas base the
/// savings cap applies to
pub struct Detection {
    pub observed_gas: u64,
    pub evidence: PatternEvidence,
}

type DetectFn = fn(&PatternContext) -> Option<Detection>;

/// One entry of the detection rule table
pub struct PatternDef {
    /// Stable identifier, also used as the insertion-order key
    pub id: &'static str,

    /// Category the finding is filed under
    pub category: OpcodeCategory,

    /// Severity assigned when the pattern fires
    pub severity: Severity,

    /// Gate: skip the pattern entirely below this total gas
    pub min_total_gas: u64,

    /// Upper bound on estimated savings before the capture cap
    pub static_savings: u64,

    /// Actionable suggestions attached to the finding
    pub recommendations: &'static [(&'static str, Difficulty)],

    /// Detection predicate over the unified aggregates
    pub detect: DetectFn,
}

/// The built-in pattern table, in insertion order
pub fn default_patterns() -> &'static [PatternDef] {
    DEFAULT_PATTERNS
}

static DEFAULT_PATTERNS: &[PatternDef] = &[
    PatternDef {
        id: "storage_slot_packing",
        category: OpcodeCategory::Storage,
        severity: Severity::High,
        min_total_gas: STORAGE_PACKING_MIN_TOTAL_GAS,
        static_savings: STORAGE_PACKING_STATIC_SAVINGS,
        recommendations: &[
            ("Pack multiple small values into a single storage slot", Difficulty::Medium),
            ("Batch storage writes and flush them once", Difficulty::Medium),
        ],
        detect: detect_storage_packing,
    },
    PatternDef {
        id: "inefficient_data_structures",
        category: OpcodeCategory::Storage,
        severity: Severity::Medium,
        min_total_gas: DATA_STRUCTURE_MIN_TOTAL_GAS,
        static_savings: DATA_STRUCTURE_STATIC_SAVINGS,
        recommendations: &[
            ("Cache repeated storage reads in memory", Difficulty::Easy),
            ("Use mappings instead of arrays for sparse lookups", Difficulty::Hard),
        ],
        detect: detect_inefficient_data_structures,
    },
    PatternDef {
        id: "loop_inefficiency",
        category: OpcodeCategory::ControlFlow,
        severity: Severity::Medium,
        min_total_gas: LOOP_MIN_TOTAL_GAS,
        static_savings: LOOP_STATIC_SAVINGS,
        recommendations: &[
            ("Hoist invariant computations out of loops", Difficulty::Easy),
            ("Cache array lengths and storage reads before iterating", Difficulty::Easy),
            ("Batch repeated external calls", Difficulty::Medium),
        ],
        detect: detect_loop_inefficiency,
    },
    PatternDef {
        id: "memory_overuse",
        category: OpcodeCategory::Memory,
        severity: Severity::Medium,
        min_total_gas: MEMORY_MIN_TOTAL_GAS,
        static_savings: MEMORY_STATIC_SAVINGS,
        recommendations: &[
            ("Reuse memory buffers instead of growing memory", Difficulty::Medium),
            ("Avoid copying large arrays into memory", Difficulty::Medium),
        ],
        detect: detect_memory_overuse,
    },
    PatternDef {
        id: "expensive_computation",
        category: OpcodeCategory::Crypto,
        severity: Severity::Medium,
        min_total_gas: COMPUTE_MIN_TOTAL_GAS,
        static_savings: COMPUTE_STATIC_SAVINGS,
        recommendations: &[
            ("Cache hash results computed from identical inputs", Difficulty::Easy),
            ("Replace exponentiation with bit shifts where possible", Difficulty::Medium),
        ],
        detect: detect_expensive_computation,
    },
    PatternDef {
        id: "function_visibility",
        category: OpcodeCategory::Memory,
        severity: Severity::Low,
        min_total_gas: VISIBILITY_MIN_TOTAL_GAS,
        static_savings: VISIBILITY_STATIC_SAVINGS,
        recommendations: &[
            ("Declare externally-called public functions as external", Difficulty::Easy),
            ("Read arguments directly from calldata instead of memory", Difficulty::Medium),
        ],
        detect: detect_function_visibility,
    },
];

/// Run the rule table over the model.
///
/// **Public** - main entry point for detection
///
/// Findings are sorted by potential gas savings descending, ties broken
/// by severity ordinal descending, then table insertion order (stable
/// sort).
pub fn detect_patterns(
    model: &UnifiedGasModel,
    patterns: &[PatternDef],
    pricing: &PricingConfig,
) -> Vec<OptimizationFinding> {
    let ctx = PatternContext::new(model);
    let total_gas = ctx.total_gas();
    let mut findings = Vec::new();

    for def in patterns {
        if total_gas < def.min_total_gas {
            continue;
        }
        let Some(detection) = (def.detect)(&ctx) else {
            continue;
        };

        let capped = (detection.observed_gas as f64 * SAVINGS_CAPTURE_FACTOR) as u64;
        let gas_amount = def.static_savings.min(capped);
        debug!("Pattern {} fired, estimated savings {gas_amount} gas", def.id);

        findings.push(OptimizationFinding {
            pattern_id: def.id.to_string(),
            category: def.category,
            severity: def.severity,
            potential_savings: PotentialSavings {
                gas_amount,
                percentage: if total_gas > 0 {
                    (gas_amount as f64 / total_gas as f64) * 100.0
                } else {
                    0.0
                },
                cost_estimate_usd: pricing.cost_usd(gas_amount),
            },
            evidence: detection.evidence,
            recommendations: def
                .recommendations
                .iter()
                .map(|(action, difficulty)| crate::model::schema::Recommendation {
                    action: (*action).to_string(),
                    difficulty: *difficulty,
                })
                .collect(),
        });
    }

    findings.sort_by(|a, b| {
        b.potential_savings
            .gas_amount
            .cmp(&a.potential_savings.gas_amount)
            .then(b.severity.cmp(&a.severity))
    });
    findings
}

fn detect_storage_packing(ctx: &PatternContext) -> Option<Detection> {
    let (writes, write_gas) = ctx.opcode_stats("SSTORE");
    if writes > STORAGE_PACKING_MIN_WRITES && write_gas > STORAGE_PACKING_MIN_WRITE_GAS {
        Some(Detection {
            observed_gas: ctx.category_gas(OpcodeCategory::Storage),
            evidence: PatternEvidence {
                summary: format!("{writes} storage writes consumed {write_gas} gas"),
                metrics: vec![
                    metric("sstore_count", writes as f64, STORAGE_PACKING_MIN_WRITES as f64),
                    metric("sstore_gas", write_gas as f64, STORAGE_PACKING_MIN_WRITE_GAS as f64),
                ],
            },
        })
    } else {
        None
    }
}

fn detect_inefficient_data_structures(ctx: &PatternContext) -> Option<Detection> {
    let (reads, read_gas) = ctx.opcode_stats("SLOAD");
    if reads > DATA_STRUCTURE_MIN_READS && read_gas > DATA_STRUCTURE_MIN_READ_GAS {
        Some(Detection {
            observed_gas: ctx.category_gas(OpcodeCategory::Storage),
            evidence: PatternEvidence {
                summary: format!("{reads} storage reads consumed {read_gas} gas"),
                metrics: vec![
                    metric("sload_count", reads as f64, DATA_STRUCTURE_MIN_READS as f64),
                    metric("sload_gas", read_gas as f64, DATA_STRUCTURE_MIN_READ_GAS as f64),
                ],
            },
        })
    } else {
        None
    }
}

fn detect_loop_inefficiency(ctx: &PatternContext) -> Option<Detection> {
    let (branches, _) = ctx.opcode_stats("JUMPI");
    let control_gas = ctx.category_gas(OpcodeCategory::ControlFlow);
    if branches > LOOP_MIN_BRANCHES && control_gas > LOOP_MIN_CONTROL_GAS {
        return Some(Detection {
            observed_gas: control_gas,
            evidence: PatternEvidence {
                summary: format!(
                    "{branches} conditional jumps with {control_gas} gas of control flow"
                ),
                metrics: vec![
                    metric("jumpi_count", branches as f64, LOOP_MIN_BRANCHES as f64),
                    metric("control_flow_gas", control_gas as f64, LOOP_MIN_CONTROL_GAS as f64),
                ],
            },
        });
    }

    // Without a step log, repeated calls to one contract plus a high
    // complexity score signal loops of external calls
    if let Some((calls, gas)) = ctx.most_called() {
        let complexity = ctx.complexity_score();
        if complexity > LOOP_MIN_COMPLEXITY && calls > LOOP_MIN_REPEAT_CALLS {
            return Some(Detection {
                observed_gas: gas,
                evidence: PatternEvidence {
                    summary: format!(
                        "one contract called {calls} times (complexity score {complexity:.1})"
                    ),
                    metrics: vec![
                        metric("repeat_calls", calls as f64, LOOP_MIN_REPEAT_CALLS as f64),
                        metric("complexity_score", complexity, LOOP_MIN_COMPLEXITY),
                    ],
                },
            });
        }
    }
    None
}

fn detect_memory_overuse(ctx: &PatternContext) -> Option<Detection> {
    let peak = ctx.max_memory_bytes();
    let memory_gas = ctx.category_gas(OpcodeCategory::Memory);
    if peak > MEMORY_MIN_PEAK_BYTES || memory_gas > MEMORY_MIN_CATEGORY_GAS {
        Some(Detection {
            observed_gas: memory_gas,
            evidence: PatternEvidence {
                summary: format!("peak memory {peak} bytes, {memory_gas} gas of memory ops"),
                metrics: vec![
                    metric("peak_memory_bytes", peak as f64, MEMORY_MIN_PEAK_BYTES as f64),
                    metric("memory_gas", memory_gas as f64, MEMORY_MIN_CATEGORY_GAS as f64),
                ],
            },
        })
    } else {
        None
    }
}

fn detect_expensive_computation(ctx: &PatternContext) -> Option<Detection> {
    let (keccaks, keccak_gas) = ctx.opcode_stats("KECCAK256");
    let (sha3s, sha3_gas) = ctx.opcode_stats("SHA3");
    let (exps, exp_gas) = ctx.opcode_stats("EXP");
    let hashes = keccaks + sha3s;

    if hashes > COMPUTE_MIN_HASHES || exps > COMPUTE_MIN_EXPS {
        Some(Detection {
            observed_gas: keccak_gas + sha3_gas + exp_gas,
            evidence: PatternEvidence {
                summary: format!("{hashes} hash operations and {exps} exponentiations"),
                metrics: vec![
                    metric("hash_count", hashes as f64, COMPUTE_MIN_HASHES as f64),
                    metric("exp_count", exps as f64, COMPUTE_MIN_EXPS as f64),
                ],
            },
        })
    } else {
        None
    }
}

fn detect_function_visibility(ctx: &PatternContext) -> Option<Detection> {
    let (copies, _) = ctx.opcode_stats("CALLDATACOPY");
    let memory_gas = ctx.category_gas(OpcodeCategory::Memory);
    if copies > VISIBILITY_MIN_COPIES && memory_gas > VISIBILITY_MIN_MEMORY_GAS {
        Some(Detection {
            observed_gas: memory_gas,
            evidence: PatternEvidence {
                summary: format!("{copies} calldata copies into memory"),
                metrics: vec![
                    metric("calldatacopy_count", copies as f64, VISIBILITY_MIN_COPIES as f64),
                    metric("memory_gas", memory_gas as f64, VISIBILITY_MIN_MEMORY_GAS as f64),
                ],
            },
        })
    } else {
        None
    }
}

fn metric(name: &str, observed: f64, threshold: f64) -> EvidenceMetric {
    EvidenceMetric {
        name: name.to_string(),
        observed,
        threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate_struct_log;
    use crate::model::unified::build_unified_model;
    use crate::parser::schema::{StructLogTrace, TraceStep};

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

    fn storage_heavy_model() -> UnifiedGasModel {
        // 4 SSTOREs totaling 25,000 gas out of a 30,000-gas run
        let steps = vec![
            step(0, "SSTORE", 10_000),
            step(1, "SSTORE", 5_000),
            step(2, "SSTORE", 5_000),
            step(3, "SSTORE", 5_000),
            step(4, "CALL", 5_000),
        ];
        build_unified_model(
            Some(aggregate_struct_log(&StructLogTrace::from_steps(steps))),
            None,
        )
    }

    #[test]
    fn test_storage_packing_savings_capped() {
        let model = storage_heavy_model();
        let findings = detect_patterns(&model, default_patterns(), &PricingConfig::default());

        let packing = findings
            .iter()
            .find(|f| f.pattern_id == "storage_slot_packing")
            .unwrap();
        // min(15_000 static, 25_000 * 0.8 = 20_000)
        assert_eq!(packing.potential_savings.gas_amount, 15_000);
        assert_eq!(packing.severity, Severity::High);
        assert!((packing.potential_savings.percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_gate_skips_below_threshold() {
        // Same shape but scaled down below the 10,000-gas gate
        let steps = vec![
            step(0, "SSTORE", 2_000),
            step(1, "SSTORE", 2_000),
            step(2, "SSTORE", 2_000),
            step(3, "SSTORE", 2_000),
        ];
        let model = build_unified_model(
            Some(aggregate_struct_log(&StructLogTrace::from_steps(steps))),
            None,
        );
        let findings = detect_patterns(&model, default_patterns(), &PricingConfig::default());
        assert!(findings.iter().all(|f| f.pattern_id != "storage_slot_packing"));
    }

    #[test]
    fn test_detection_is_deterministic() {
        let model = storage_heavy_model();
        let pricing = PricingConfig::default();
        let first = detect_patterns(&model, default_patterns(), &pricing);
        let second = detect_patterns(&model, default_patterns(), &pricing);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_ordering_by_savings_then_severity() {
        fn always(ctx: &PatternContext) -> Option<Detection> {
            Some(Detection {
                observed_gas: ctx.total_gas(),
                evidence: PatternEvidence {
                    summary: "always fires".to_string(),
                    metrics: Vec::new(),
                },
            })
        }

        static TABLE: &[PatternDef] = &[
            PatternDef {
                id: "low_first",
                category: OpcodeCategory::Other,
                severity: Severity::Low,
                min_total_gas: 0,
                static_savings: 1_000,
                recommendations: &[],
                detect: always,
            },
            PatternDef {
                id: "critical_same_savings",
                category: OpcodeCategory::Other,
                severity: Severity::Critical,
                min_total_gas: 0,
                static_savings: 1_000,
                recommendations: &[],
                detect: always,
            },
            PatternDef {
                id: "big_savings",
                category: OpcodeCategory::Other,
                severity: Severity::Low,
                min_total_gas: 0,
                static_savings: 9_000,
                recommendations: &[],
                detect: always,
            },
        ];

        let model = storage_heavy_model();
        let findings = detect_patterns(&model, TABLE, &PricingConfig::default());

        let ids: Vec<&str> = findings.iter().map(|f| f.pattern_id.as_str()).collect();
        assert_eq!(ids, vec!["big_savings", "critical_same_savings", "low_first"]);
    }

    #[test]
    fn test_empty_model_produces_no_findings() {
        let model = build_unified_model(None, None);
        let findings = detect_patterns(&model, default_patterns(), &PricingConfig::default());
        assert!(findings.is_empty());
    }
}
