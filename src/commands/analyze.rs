//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Reads the struct-log and/or call-trace JSON files
//! 2. Ingests and validates both trace forms
//! 3. Runs the analysis pipeline
//! 4. Writes the unified analysis JSON
//! 5. Optionally prints a text summary

use crate::analysis::cost::{load_pricing, PricingConfig};
use crate::engine::analyze;
use crate::model::unified::TraceInput;
use crate::output::{render_summary, write_analysis};
use crate::parser::{parse_call_trace, parse_struct_log};
use crate::utils::error::ParseError;
use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Path to the struct-log JSON file (optional)
    pub struct_log: Option<PathBuf>,

    /// Path to the call-trace JSON file (optional)
    pub call_trace: Option<PathBuf>,

    /// Path to a pricing TOML file (optional)
    pub pricing_file: Option<PathBuf>,

    /// Gas price override in gwei
    pub gas_price_gwei: Option<f64>,

    /// Native-currency USD price override
    pub native_usd_price: Option<f64>,

    /// Output path for the analysis JSON
    pub output: PathBuf,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            struct_log: None,
            call_trace: None,
            pricing_file: None,
            gas_price_gwei: None,
            native_usd_price: None,
            output: PathBuf::from("analysis.json"),
            print_summary: false,
        }
    }
}

/// Validate analyze arguments before running
///
/// **Public** - called from main.rs
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.struct_log.is_none() && args.call_trace.is_none() {
        bail!("At least one of --struct-log or --call-trace is required");
    }
    for path in [&args.struct_log, &args.call_trace, &args.pricing_file]
        .into_iter()
        .flatten()
    {
        if !path.exists() {
            bail!("Input file not found: {}", path.display());
        }
    }
    Ok(())
}

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Trace file read or parse errors (validation errors list every
///   violation found)
/// * Pricing configuration errors
/// * Output write errors
pub fn execute_analyze(args: AnalyzeArgs) -> Result<()> {
    let start_time = Instant::now();

    // Step 1: load trace documents
    info!("Step 1/4: Reading trace files...");
    let struct_log = args
        .struct_log
        .as_deref()
        .map(|path| {
            let raw = read_json(path)?;
            describe_validation(parse_struct_log(&raw), path)
        })
        .transpose()?;
    let call_trace = args
        .call_trace
        .as_deref()
        .map(|path| {
            let raw = read_json(path)?;
            describe_validation(parse_call_trace(&raw), path)
        })
        .transpose()?;

    // Step 2: resolve pricing
    info!("Step 2/4: Resolving pricing configuration...");
    let pricing = resolve_pricing(&args)?;
    debug!(
        "Pricing: {} gwei, ${} per native unit",
        pricing.gas_price_gwei, pricing.native_usd_price
    );

    // Step 3: run the pipeline
    info!("Step 3/4: Running analysis pipeline...");
    let input = TraceInput::from_parts(struct_log.as_ref(), call_trace.as_ref());
    let result = analyze(input, &pricing);

    debug!(
        "Analysis complete: {} gas, {} findings",
        result.total_gas_used,
        result.optimization_findings.len()
    );

    // Step 4: write output
    info!("Step 4/4: Writing analysis output...");
    write_analysis(&result, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if args.print_summary {
        println!("{}", render_summary(&result));
    }

    info!(
        "Done in {:.2}s: {}",
        start_time.elapsed().as_secs_f64(),
        args.output.display()
    );
    Ok(())
}

/// Merge pricing sources: file first, then CLI overrides, else defaults
fn resolve_pricing(args: &AnalyzeArgs) -> Result<PricingConfig> {
    let mut pricing = match &args.pricing_file {
        Some(path) => load_pricing(path)
            .with_context(|| format!("Failed to load pricing from {}", path.display()))?,
        None => PricingConfig::default(),
    };
    if let Some(gwei) = args.gas_price_gwei {
        pricing.gas_price_gwei = gwei;
    }
    if let Some(usd) = args.native_usd_price {
        pricing.native_usd_price = usd;
    }
    pricing.validate().context("Invalid pricing override")?;
    Ok(pricing)
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Attach the full violation list to validation failures so users see
/// every problem at once
fn describe_validation<T>(result: Result<T, ParseError>, path: &Path) -> Result<T> {
    result.map_err(|e| match e {
        ParseError::Validation(v) => {
            anyhow::anyhow!("{} failed validation:\n{}", path.display(), v.detail())
        }
        other => anyhow::Error::from(other).context(format!("Failed to parse {}", path.display())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validate_args_requires_an_input() {
        let args = AnalyzeArgs::default();
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_checks_existence() {
        let args = AnalyzeArgs {
            struct_log: Some(PathBuf::from("/nonexistent/trace.json")),
            ..AnalyzeArgs::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_execute_analyze_end_to_end() {
        let mut trace_file = tempfile::NamedTempFile::new().unwrap();
        write!(
            trace_file,
            r#"{{"structLogs": [
                {{"step": 0, "opcode": "SSTORE", "gasCost": 20000}},
                {{"step": 1, "opcode": "ADD", "gasCost": 3}}
            ]}}"#
        )
        .unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("analysis.json");

        let args = AnalyzeArgs {
            struct_log: Some(trace_file.path().to_path_buf()),
            output: output.clone(),
            ..AnalyzeArgs::default()
        };
        validate_args(&args).unwrap();
        execute_analyze(args).unwrap();

        let loaded = crate::output::read_analysis(&output).unwrap();
        assert_eq!(loaded.total_gas_used, 20_003);
    }

    #[test]
    fn test_execute_analyze_surfaces_violations() {
        let mut trace_file = tempfile::NamedTempFile::new().unwrap();
        write!(
            trace_file,
            r#"{{"structLogs": [{{"step": 0, "opcode": "ADD", "gasCost": -5}}]}}"#
        )
        .unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let args = AnalyzeArgs {
            struct_log: Some(trace_file.path().to_path_buf()),
            output: out_dir.path().join("analysis.json"),
            ..AnalyzeArgs::default()
        };

        let err = execute_analyze(args).unwrap_err();
        assert!(err.to_string().contains("failed validation"));
    }
}
