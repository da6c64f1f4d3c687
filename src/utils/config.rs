//! Configuration and constants for the analysis engine.
//!
//! The detection thresholds and benchmark values below are empirically
//! chosen; they live here as named constants so they can be tuned without
//! touching detection or scoring logic.

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Efficiency benchmarks. Scores compare observed values against these
// reference points and are clamped to [0, 100].
pub const GAS_PER_CALL_BENCHMARK: f64 = 50_000.0;
pub const SUCCESS_RATE_BENCHMARK: f64 = 95.0;
pub const GAS_PER_OPCODE_BENCHMARK: f64 = 3.0;
pub const MEMORY_REFERENCE_UNITS: f64 = 1_000.0;

/// Score assigned when a metric has no denominator (no calls, no steps).
/// Interpreted as "no evidence of inefficiency", never NaN or Infinity.
pub const NO_EVIDENCE_SCORE: f64 = 100.0;

/// Divisor in the struct-log efficiency score:
/// `max(0, 100 - (avg_gas_per_step / 1000) * 100)`
pub const STEP_EFFICIENCY_DIVISOR: f64 = 1_000.0;

// Cost estimation. One native unit is 1e18 wei, one gwei is 1e9 wei, so
// cost_native = gas * gas_price_gwei / 1e9.
pub const WEI_PER_GWEI: f64 = 1e9;
pub const WEI_PER_NATIVE: f64 = 1e18;

/// Number of top gas-consuming entries included in the cost analysis
pub const TOP_COST_ENTRIES: usize = 5;

/// Fallback pricing used when no configuration is supplied. Placeholder
/// values; production callers should inject real pricing (CLI flags or a
/// TOML file).
pub const DEFAULT_GAS_PRICE_GWEI: f64 = 20.0;
pub const DEFAULT_NATIVE_USD_PRICE: f64 = 2_000.0;

/// Fraction of observed category gas a pattern can realistically save.
/// Caps static savings estimates: `min(static, observed * 0.8)`.
pub const SAVINGS_CAPTURE_FACTOR: f64 = 0.8;

// Field names for trace ingestion (different tracer implementations use
// different names)
pub const STEP_FIELD_NAMES: &[&str] = &["structLogs", "struct_logs", "steps", "trace", "logs"];
pub const CALL_FIELD_NAMES: &[&str] = &["callData", "call_data", "calls", "trace"];
