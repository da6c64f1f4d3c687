//! Exhaustive validation of raw trace records.
//!
//! Validation is not fail-fast: every violation in the input is collected
//! and reported in a single `ValidationError` so callers get a complete
//! diagnostic in one pass. Validation operates on raw JSON values because
//! the violations it must report (negative gas, missing fields) would
//! otherwise be swallowed by typed deserialization.

use super::ingest::parse_gas_value;
use super::schema::{CallRecord, TraceStep};
use crate::utils::error::{ValidationError, Violation};
use log::warn;
use serde_json::Value;
use std::collections::HashSet;

/// Validate a raw step array and produce typed steps.
///
/// **Public** - called by ingestion
///
/// Checks, per step: required `step` index (non-negative, strictly
/// increasing), required non-empty opcode, non-negative gas cost, depth,
/// stack depth, and memory size.
pub fn validate_steps(raw: &[Value]) -> Result<Vec<TraceStep>, ValidationError> {
    let mut violations = Vec::new();
    let mut steps = Vec::with_capacity(raw.len());
    let mut prev_index: Option<u64> = None;

    for (i, value) in raw.iter().enumerate() {
        let Some(obj) = value.as_object() else {
            push(&mut violations, format!("steps[{i}]"), "expected a JSON object");
            continue;
        };

        let index = match field(obj, &["step", "index"]) {
            Some(v) => match as_u64(v) {
                Ok(n) => {
                    if let Some(prev) = prev_index {
                        if n <= prev {
                            push(
                                &mut violations,
                                format!("steps[{i}].step"),
                                format!("step index {n} is not greater than previous index {prev}"),
                            );
                        }
                    }
                    prev_index = Some(n);
                    Some(n)
                }
                Err(msg) => {
                    push(&mut violations, format!("steps[{i}].step"), msg);
                    None
                }
            },
            None => {
                push(&mut violations, format!("steps[{i}].step"), "missing required field");
                None
            }
        };

        let opcode = match field(obj, &["opcode", "op"]).and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => Some(s.to_string()),
            _ => {
                push(&mut violations, format!("steps[{i}].opcode"), "missing or empty opcode");
                None
            }
        };

        let gas_cost = checked_u64(obj, &["gasCost", "gas_cost"], format!("steps[{i}].gasCost"), &mut violations);
        let depth = checked_u64(obj, &["depth"], format!("steps[{i}].depth"), &mut violations);
        let stack_depth = checked_u64(
            obj,
            &["stackDepth", "stack_depth"],
            format!("steps[{i}].stackDepth"),
            &mut violations,
        );
        let memory_size = checked_u64(
            obj,
            &["memorySizeBytes", "memory_size_bytes", "memSize"],
            format!("steps[{i}].memorySizeBytes"),
            &mut violations,
        );

        if let (Some(step), Some(opcode)) = (index, opcode) {
            steps.push(TraceStep {
                step,
                opcode,
                gas_cost: gas_cost.unwrap_or(0),
                depth: depth.unwrap_or(0) as u32,
                stack_depth: stack_depth.unwrap_or(0) as u32,
                memory_size_bytes: memory_size.unwrap_or(0),
            });
        }
    }

    if violations.is_empty() {
        Ok(steps)
    } else {
        Err(ValidationError { violations })
    }
}

/// Validate a raw call-record array and produce typed records.
///
/// **Public** - called by ingestion
///
/// Checks, per record: required unique `id`, non-negative gas and value,
/// and non-negative `traceAddress` elements. An explicit `success` flag
/// that contradicts the presence of an error string is normalized (false
/// iff an error is present) with a warning, not rejected.
pub fn validate_call_records(raw: &[Value]) -> Result<Vec<CallRecord>, ValidationError> {
    let mut violations = Vec::new();
    let mut records = Vec::with_capacity(raw.len());
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (i, value) in raw.iter().enumerate() {
        let Some(obj) = value.as_object() else {
            push(&mut violations, format!("callData[{i}]"), "expected a JSON object");
            continue;
        };

        let id = match field(obj, &["id"]).and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => {
                if !seen_ids.insert(s.to_string()) {
                    push(
                        &mut violations,
                        format!("callData[{i}].id"),
                        format!("duplicate call id \"{s}\""),
                    );
                }
                Some(s.to_string())
            }
            _ => {
                push(&mut violations, format!("callData[{i}].id"), "missing or empty id");
                None
            }
        };

        let gas_used = checked_u64(
            obj,
            &["gasUsed", "gas_used"],
            format!("callData[{i}].gasUsed"),
            &mut violations,
        );

        let value_transferred = match field(obj, &["valueTransferred", "value_transferred", "value"]) {
            Some(v) => match as_f64(v) {
                Ok(n) if n >= 0.0 => n,
                Ok(n) => {
                    push(
                        &mut violations,
                        format!("callData[{i}].valueTransferred"),
                        format!("negative value {n}"),
                    );
                    0.0
                }
                Err(msg) => {
                    push(&mut violations, format!("callData[{i}].valueTransferred"), msg);
                    0.0
                }
            },
            None => 0.0,
        };

        let trace_address = match field(obj, &["traceAddress", "trace_address"]) {
            Some(Value::Array(items)) => {
                let mut path = Vec::with_capacity(items.len());
                for (j, item) in items.iter().enumerate() {
                    match as_u64(item) {
                        Ok(n) => path.push(n as u32),
                        Err(msg) => push(
                            &mut violations,
                            format!("callData[{i}].traceAddress[{j}]"),
                            msg,
                        ),
                    }
                }
                path
            }
            Some(_) => {
                push(
                    &mut violations,
                    format!("callData[{i}].traceAddress"),
                    "expected an array of integers",
                );
                Vec::new()
            }
            None => Vec::new(),
        };

        let error = field(obj, &["error"])
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from);

        // Invariant: success is false iff an error string is present.
        // An explicit flag that disagrees is normalized, not rejected.
        let success = match field(obj, &["success"]).and_then(Value::as_bool) {
            Some(flag) => {
                if flag == error.is_some() {
                    warn!(
                        "callData[{}]: success={} contradicts error presence; normalizing",
                        i, flag
                    );
                }
                error.is_none()
            }
            None => error.is_none(),
        };

        if let Some(id) = id {
            records.push(CallRecord {
                id,
                parent_id: string_field(obj, &["parentId", "parent_id"]),
                trace_address,
                from: string_field(obj, &["from"]).unwrap_or_default(),
                to: string_field(obj, &["to"]).unwrap_or_default(),
                call_type: string_field(obj, &["type", "callType", "call_type"])
                    .unwrap_or_else(|| "CALL".to_string()),
                gas_used: gas_used.unwrap_or(0),
                value_transferred,
                success,
                error,
                contract_label: string_field(obj, &["contractLabel", "contract_label", "label"]),
                input_preview: string_field(obj, &["inputPreview", "input_preview"]),
            });
        }
    }

    if violations.is_empty() {
        Ok(records)
    } else {
        Err(ValidationError { violations })
    }
}

fn push(violations: &mut Vec<Violation>, location: String, message: impl Into<String>) {
    violations.push(Violation {
        location,
        message: message.into(),
    });
}

/// Look up the first present field among the given aliases
fn field<'a>(obj: &'a serde_json::Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| obj.get(*name))
}

fn string_field(obj: &serde_json::Map<String, Value>, names: &[&str]) -> Option<String> {
    field(obj, names)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Extract an optional non-negative integer field, recording a violation
/// on negative or unparseable values
fn checked_u64(
    obj: &serde_json::Map<String, Value>,
    names: &[&str],
    location: String,
    violations: &mut Vec<Violation>,
) -> Option<u64> {
    match field(obj, names) {
        Some(v) => match as_u64(v) {
            Ok(n) => Some(n),
            Err(msg) => {
                push(violations, location, msg);
                None
            }
        },
        None => None,
    }
}

/// Interpret a JSON value as a non-negative integer.
///
/// Accepts numbers and hex/decimal strings; negative values are an error
/// message, not a panic.
fn as_u64(value: &Value) -> Result<u64, String> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok(u)
            } else if let Some(i) = n.as_i64() {
                Err(format!("negative value {i}"))
            } else if let Some(f) = n.as_f64() {
                if f >= 0.0 && f.fract() == 0.0 {
                    Ok(f as u64)
                } else {
                    Err(format!("expected a non-negative integer, found {f}"))
                }
            } else {
                Err("unrepresentable number".to_string())
            }
        }
        Value::String(s) => parse_gas_value(s).map_err(|e| e.to_string()),
        other => Err(format!("expected a number, found {other}")),
    }
}

/// Interpret a JSON value as a finite float
fn as_f64(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .ok_or_else(|| "unrepresentable number".to_string()),
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|e| format!("invalid numeric string: {e}")),
        other => Err(format!("expected a number, found {other}")),
    }
}
