//! Gas Trace Studio CLI
//!
//! A trace analysis and gas optimization tool for Ethereum transactions.
//! Produces categorized gas breakdowns, cost estimates, and optimization
//! findings from transaction traces.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use gas_trace_studio::commands::{execute_analyze, validate_args, AnalyzeArgs};
use gas_trace_studio::output::read_analysis;
use gas_trace_studio::utils::config::SCHEMA_VERSION;

/// Gas Trace Studio - Trace analysis and gas optimization for Ethereum
#[derive(Parser, Debug)]
#[command(name = "gas-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze transaction traces
    Analyze {
        /// Path to the struct-log JSON file
        #[arg(short, long)]
        struct_log: Option<PathBuf>,

        /// Path to the call-trace JSON file
        #[arg(short, long)]
        call_trace: Option<PathBuf>,

        /// Path to a pricing TOML file
        #[arg(long)]
        pricing: Option<PathBuf>,

        /// Gas price in gwei (overrides the pricing file)
        #[arg(long)]
        gas_price: Option<f64>,

        /// Native-currency USD price (overrides the pricing file)
        #[arg(long)]
        usd_price: Option<f64>,

        /// Output path for the analysis JSON
        #[arg(short, long, default_value = "analysis.json")]
        output: PathBuf,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate an analysis JSON file
    Validate {
        /// Path to analysis JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Analyze {
            struct_log,
            call_trace,
            pricing,
            gas_price,
            usd_price,
            output,
            summary,
        } => {
            let args = AnalyzeArgs {
                struct_log,
                call_trace,
                pricing_file: pricing,
                gas_price_gwei: gas_price,
                native_usd_price: usd_price,
                output,
                print_summary: summary,
            };

            validate_args(&args)?;
            execute_analyze(args)?;
        }

        Commands::Validate { file } => {
            validate_analysis_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Validate an analysis JSON file
///
/// **Private** - internal command implementation
fn validate_analysis_file(file_path: PathBuf) -> Result<()> {
    println!("Validating analysis: {}", file_path.display());

    let result = read_analysis(&file_path)?;

    println!("✓ Valid analysis JSON");
    println!("  Version: {}", result.version);
    println!("  Total Gas: {}", result.total_gas_used);
    println!("  Categories: {}", result.gas_breakdown.len());
    println!("  Contracts: {}", result.contract_attribution.len());
    println!("  Findings: {}", result.optimization_findings.len());
    println!("  Warnings: {}", result.warnings.len());

    Ok(())
}

/// Display schema information
///
/// **Private** - internal command implementation
fn display_schema(show_details: bool) {
    println!("Gas Trace Studio Analysis Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string             - Schema version (e.g., '1.0.0')");
        println!("  generated_at: string        - ISO 8601 timestamp");
        println!("  total_gas_used: number      - Total gas used by the transaction");
        println!("  gas_breakdown: array        - Per-category gas totals");
        println!("    category, gas_used, count, percentage_of_total");
        println!("  contract_attribution: array - Per-contract gas totals");
        println!("    address, gas_used, call_count, success_rate");
        println!("  efficiency_metrics: array   - Scored metrics, overall first");
        println!("  cost_analysis: array        - Cost of top gas consumers");
        println!("  optimization_findings: array - Ranked findings with evidence");
        println!("  call_hierarchy: array       - Reconstructed call forest");
        println!("  execution_timeline: array   - Cumulative gas per step");
        println!("  heatmap: array              - Gas intensity per step");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
///
/// **Private** - internal command implementation
fn display_version() {
    println!("Gas Trace Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Analysis Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("A trace analysis and gas optimization tool for Ethereum transactions.");
}
