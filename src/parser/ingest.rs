//! Ingestion of raw trace JSON.
//!
//! Locates the record arrays inside the documents produced by different
//! tracer implementations, runs exhaustive validation, and hands back the
//! typed input model. Summary blocks are recomputed from the records so
//! they are always consistent with the data.

use super::schema::{CallTrace, StructLogTrace};
use super::validate::{validate_call_records, validate_steps};
use crate::utils::config::{CALL_FIELD_NAMES, STEP_FIELD_NAMES};
use crate::utils::error::ParseError;
use log::{debug, warn};
use serde_json::Value;

/// Parse a raw struct-log document.
///
/// **Public** - main entry point for step-log ingestion
///
/// # Arguments
/// * `raw` - Raw JSON: either a bare step array or an object carrying one
///   under a known field name
///
/// # Errors
/// * `ParseError::InvalidFormat` - Document is neither object nor array
/// * `ParseError::Validation` - One or more records are malformed; every
///   violation is listed
pub fn parse_struct_log(raw: &Value) -> Result<StructLogTrace, ParseError> {
    let steps_array = locate_records(raw, STEP_FIELD_NAMES, "step log")?;
    let steps = validate_steps(&steps_array)?;

    debug!("Ingested {} execution steps", steps.len());
    Ok(StructLogTrace::from_steps(steps))
}

/// Parse a raw call-trace document.
///
/// **Public** - main entry point for call-trace ingestion
///
/// # Errors
/// * `ParseError::InvalidFormat` - Document is neither object nor array
/// * `ParseError::Validation` - One or more records are malformed; every
///   violation is listed
pub fn parse_call_trace(raw: &Value) -> Result<CallTrace, ParseError> {
    let call_array = locate_records(raw, CALL_FIELD_NAMES, "call trace")?;
    let records = validate_call_records(&call_array)?;

    debug!("Ingested {} call records", records.len());
    Ok(CallTrace::from_records(records))
}

/// Find the record array in a trace document.
///
/// Accepts a bare array, or an object carrying the array under one of the
/// known field names. An object without any known field yields an empty
/// record set (valid for degenerate transactions), with a warning.
fn locate_records(raw: &Value, field_names: &[&str], what: &str) -> Result<Vec<Value>, ParseError> {
    match raw {
        Value::Array(items) => Ok(items.clone()),

        Value::Object(obj) => {
            for field in field_names {
                if let Some(Value::Array(items)) = obj.get(*field) {
                    return Ok(items.clone());
                }
            }
            warn!("No record array found in {what} document, treating as empty");
            Ok(Vec::new())
        }

        _ => Err(ParseError::InvalidFormat(format!(
            "{what} must be a JSON object or array"
        ))),
    }
}

/// Parse a gas value from a hex (0x-prefixed) or decimal string
///
/// **Public** - shared with validation
pub fn parse_gas_value(value: &str) -> Result<u64, ParseError> {
    if let Some(hex_str) = value.strip_prefix("0x") {
        u64::from_str_radix(hex_str, 16)
            .map_err(|e| ParseError::InvalidFormat(format!("Invalid hex gas value: {e}")))
    } else {
        value
            .parse::<u64>()
            .map_err(|e| ParseError::InvalidFormat(format!("Invalid decimal gas value: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_struct_log_object_form() {
        let raw = json!({
            "structLogs": [
                {"step": 0, "opcode": "SSTORE", "gasCost": 20000},
                {"step": 1, "opcode": "ADD", "gasCost": 3}
            ]
        });
        let trace = parse_struct_log(&raw).unwrap();
        assert_eq!(trace.steps.len(), 2);
        assert_eq!(trace.summary.total_gas_cost, 20_003);
        assert_eq!(trace.summary.total_steps, 2);
    }

    #[test]
    fn test_parse_struct_log_bare_array() {
        let raw = json!([{"step": 0, "op": "MLOAD", "gasCost": 3}]);
        let trace = parse_struct_log(&raw).unwrap();
        assert_eq!(trace.steps[0].opcode, "MLOAD");
    }

    #[test]
    fn test_parse_struct_log_rejects_scalar() {
        let raw = json!("not a trace");
        assert!(matches!(
            parse_struct_log(&raw),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_call_trace_computes_stats() {
        let raw = json!({
            "callData": [
                {"id": "root", "to": "0xaaa", "gasUsed": 50000, "traceAddress": []},
                {"id": "c0", "parentId": "root", "to": "0xbbb", "gasUsed": 20000,
                 "traceAddress": [0], "error": "out of gas"}
            ]
        });
        let trace = parse_call_trace(&raw).unwrap();
        assert_eq!(trace.transaction_stats.total_calls, 2);
        assert_eq!(trace.transaction_stats.total_gas, 50_000);
        assert_eq!(trace.transaction_stats.errors, 1);
    }

    #[test]
    fn test_parse_gas_value() {
        assert_eq!(parse_gas_value("0x5208").unwrap(), 21_000);
        assert_eq!(parse_gas_value("42").unwrap(), 42);
        assert!(parse_gas_value("bogus").is_err());
    }
}
