//! Trace ingestion and input schema definitions.
//!
//! This module handles:
//! - Parsing raw JSON produced by geth-style tracers
//! - Exhaustive validation of both trace forms
//! - Defining the input data model (steps, call records, summaries)

pub mod ingest;
pub mod schema;
pub mod validate;

// Re-export main types
pub use ingest::{parse_call_trace, parse_struct_log};
pub use schema::{CallRecord, CallTrace, StructLogSummary, StructLogTrace, TraceStep, TransactionStats};
pub use validate::{validate_call_records, validate_steps};
