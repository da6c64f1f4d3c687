//! Call-trace aggregation.
//!
//! Reconstructs the call tree from trace-address paths, attributes gas to
//! contracts, and summarizes interaction patterns. Reconstruction uses an
//! arena plus a `traceAddress -> node` index instead of pointer linking,
//! so orphan detection is a missing-key lookup and the result is a forest
//! (callers must handle multiple roots).

use crate::model::schema::{
    CallNode, ContractGasEntry, InteractionSummary, MostCalledContract, ValueTransfer,
};
use crate::parser::schema::{CallRecord, CallTrace};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// Everything derived from the call trace
#[derive(Debug, Clone, Default)]
pub struct CallTraceAggregation {
    /// Per-contract gas attribution, descending by gas
    pub contract_entries: Vec<ContractGasEntry>,

    /// Reconstructed call forest
    pub call_hierarchy: Vec<CallNode>,

    /// Nonzero value movements, descending by value
    pub value_transfers: Vec<ValueTransfer>,

    /// Interaction-pattern summary
    pub interaction: InteractionSummary,

    /// Recoverable structural inconsistencies found during reconstruction
    pub warnings: Vec<String>,

    /// Total gas used by the whole trace
    pub total_gas: u64,

    /// Number of call records processed
    pub call_count: u64,
}

/// Aggregate a validated call trace.
///
/// **Public** - main entry point for call-trace aggregation
pub fn aggregate_call_trace(trace: &CallTrace) -> CallTraceAggregation {
    let records = &trace.call_data;
    debug!("Aggregating {} call records", records.len());

    let total_gas = trace.transaction_stats.total_gas;
    let mut warnings = Vec::new();

    let call_hierarchy = reconstruct_forest(records, &mut warnings);
    let contract_entries = attribute_gas(records, total_gas);
    let value_transfers = collect_value_transfers(records);
    let interaction = summarize_interactions(records);

    CallTraceAggregation {
        contract_entries,
        call_hierarchy,
        value_transfers,
        interaction,
        warnings,
        total_gas,
        call_count: records.len() as u64,
    }
}

/// Rebuild the call forest from trace-address paths.
///
/// Each record's parent key is its trace address with the last element
/// removed. A record whose `parentId` does not resolve, or whose parent
/// key is absent from the index, becomes an additional root and emits a
/// warning; analysis proceeds.
fn reconstruct_forest(records: &[CallRecord], warnings: &mut Vec<String>) -> Vec<CallNode> {
    // Arena: children[i] holds the record indices attached under record i
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut roots: Vec<usize> = Vec::new();

    // Pass 1: index every record by its trace address
    let mut index: HashMap<&[u32], usize> = HashMap::new();
    let known_ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();

    for (i, record) in records.iter().enumerate() {
        if let Some(prev) = index.insert(record.trace_address.as_slice(), i) {
            let message = format!(
                "call \"{}\" duplicates trace address {:?} of call \"{}\"",
                record.id, record.trace_address, records[prev].id
            );
            warn!("{message}");
            warnings.push(message);
        }
    }

    // Pass 2: attach each record to its parent, or promote to root
    for (i, record) in records.iter().enumerate() {
        if let Some(parent_id) = record.parent_id.as_deref() {
            if !known_ids.contains(parent_id) {
                let message = format!(
                    "call \"{}\" references unknown parent \"{}\"; treating as root",
                    record.id, parent_id
                );
                warn!("{message}");
                warnings.push(message);
                roots.push(i);
                continue;
            }
        }

        if record.trace_address.is_empty() {
            roots.push(i);
            continue;
        }

        let parent_key = &record.trace_address[..record.trace_address.len() - 1];
        match index.get(parent_key) {
            Some(&parent) if parent != i => children[parent].push(i),
            _ => {
                let message = format!(
                    "call \"{}\" has no parent at trace address {:?}; treating as root",
                    record.id, parent_key
                );
                warn!("{message}");
                warnings.push(message);
                roots.push(i);
            }
        }
    }

    // Children in call order (last trace-address element)
    for child_list in &mut children {
        child_list.sort_by_key(|&i| records[i].trace_address.last().copied().unwrap_or(0));
    }

    roots
        .iter()
        .map(|&root| materialize(root, records, &children))
        .collect()
}

/// Turn one arena subtree into a plain serializable node
fn materialize(index: usize, records: &[CallRecord], children: &[Vec<usize>]) -> CallNode {
    let record = &records[index];
    CallNode {
        id: record.id.clone(),
        from: record.from.clone(),
        to: record.to.clone(),
        call_type: record.call_type.clone(),
        gas_used: record.gas_used,
        value_transferred: record.value_transferred,
        success: record.success,
        error: record.error.clone(),
        contract_label: record.contract_label.clone(),
        input_preview: record.input_preview.clone(),
        trace_address: record.trace_address.clone(),
        children: children[index]
            .iter()
            .map(|&child| materialize(child, records, children))
            .collect(),
    }
}

/// Group gas by callee address
fn attribute_gas(records: &[CallRecord], total_gas: u64) -> Vec<ContractGasEntry> {
    struct Accum {
        gas_used: u64,
        call_count: u64,
        successes: u64,
        label: Option<String>,
    }

    let mut by_contract: HashMap<&str, Accum> = HashMap::new();
    for record in records {
        let entry = by_contract.entry(record.to.as_str()).or_insert(Accum {
            gas_used: 0,
            call_count: 0,
            successes: 0,
            label: None,
        });
        entry.gas_used += record.gas_used;
        entry.call_count += 1;
        if record.success {
            entry.successes += 1;
        }
        if entry.label.is_none() {
            entry.label = record.contract_label.clone();
        }
    }

    let mut entries: Vec<ContractGasEntry> = by_contract
        .into_iter()
        .map(|(address, accum)| ContractGasEntry {
            address: address.to_string(),
            label: accum.label,
            gas_used: accum.gas_used,
            call_count: accum.call_count,
            percentage_of_total: percentage(accum.gas_used, total_gas),
            success_rate: if accum.call_count > 0 {
                (accum.successes as f64 / accum.call_count as f64) * 100.0
            } else {
                0.0
            },
        })
        .collect();

    entries.sort_by(|a, b| b.gas_used.cmp(&a.gas_used).then(a.address.cmp(&b.address)));
    entries
}

/// Keep only calls that moved value, largest first
fn collect_value_transfers(records: &[CallRecord]) -> Vec<ValueTransfer> {
    let mut transfers: Vec<ValueTransfer> = records
        .iter()
        .filter(|r| r.value_transferred > 0.0)
        .map(|r| ValueTransfer {
            from: r.from.clone(),
            to: r.to.clone(),
            call_type: r.call_type.clone(),
            value: r.value_transferred,
        })
        .collect();

    transfers.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    transfers
}

fn summarize_interactions(records: &[CallRecord]) -> InteractionSummary {
    if records.is_empty() {
        return InteractionSummary::default();
    }

    // Counts in first-encounter order so ties resolve deterministically
    let mut counts: HashMap<&str, u64> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    let mut labels: HashMap<&str, &str> = HashMap::new();

    for record in records {
        let count = counts.entry(record.to.as_str()).or_insert_with(|| {
            order.push(record.to.as_str());
            0
        });
        *count += 1;
        if let Some(label) = record.contract_label.as_deref() {
            labels.entry(record.to.as_str()).or_insert(label);
        }
    }

    // Strict comparison keeps the first-encountered contract on ties
    let mut top: Option<(&str, u64)> = None;
    for address in &order {
        let count = counts[address];
        if top.map(|(_, best)| count > best).unwrap_or(true) {
            top = Some((address, count));
        }
    }
    let most_called = top.map(|(address, call_count)| MostCalledContract {
        address: address.to_string(),
        label: labels.get(address).map(|l| l.to_string()),
        call_count,
    });

    let total = records.len() as f64;
    let avg_call_depth = records
        .iter()
        .map(|r| r.trace_address.len() as f64)
        .sum::<f64>()
        / total;
    let failed_calls = records.iter().filter(|r| !r.success).count() as u64;
    let unique_contracts = counts.len() as u64;

    InteractionSummary {
        unique_contracts,
        most_called,
        avg_call_depth,
        failed_calls,
        failure_rate: (failed_calls as f64 / total) * 100.0,
        complexity_score: unique_contracts as f64 * avg_call_depth + failed_calls as f64,
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

    fn record(id: &str, parent: Option<&str>, path: &[u32], to: &str, gas: u64) -> CallRecord {
        CallRecord {
            id: id.to_string(),
            parent_id: parent.map(String::from),
            trace_address: path.to_vec(),
            from: "0xcaller".to_string(),
            to: to.to_string(),
            call_type: "CALL".to_string(),
            gas_used: gas,
            value_transferred: 0.0,
            success: true,
            error: None,
            contract_label: None,
            input_preview: None,
        }
    }

    #[test]
    fn test_forest_reconstruction() {
        let trace = CallTrace::from_records(vec![
            record("root", None, &[], "0xaaa", 100_000),
            record("c0", Some("root"), &[0], "0xbbb", 30_000),
            record("c1", Some("root"), &[1], "0xccc", 20_000),
            record("c0-0", Some("c0"), &[0, 0], "0xddd", 5_000),
        ]);
        let agg = aggregate_call_trace(&trace);

        assert_eq!(agg.call_hierarchy.len(), 1);
        let root = &agg.call_hierarchy[0];
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].id, "c0");
        assert_eq!(root.children[0].children[0].id, "c0-0");
        assert!(agg.warnings.is_empty());
    }

    #[test]
    fn test_child_order_follows_trace_address() {
        // Children arrive out of order; the forest re-sorts them
        let trace = CallTrace::from_records(vec![
            record("root", None, &[], "0xaaa", 100_000),
            record("c1", Some("root"), &[1], "0xccc", 20_000),
            record("c0", Some("root"), &[0], "0xbbb", 30_000),
        ]);
        let agg = aggregate_call_trace(&trace);
        let root = &agg.call_hierarchy[0];
        assert_eq!(root.children[0].id, "c0");
        assert_eq!(root.children[1].id, "c1");
    }

    #[test]
    fn test_unresolvable_parent_becomes_root_with_warning() {
        let trace = CallTrace::from_records(vec![
            record("root", None, &[], "0xaaa", 100_000),
            record("orphan", Some("ghost"), &[0], "0xbbb", 30_000),
        ]);
        let agg = aggregate_call_trace(&trace);

        assert_eq!(agg.call_hierarchy.len(), 2);
        assert_eq!(agg.warnings.len(), 1);
        assert!(agg.warnings[0].contains("ghost"));
    }

    #[test]
    fn test_missing_prefix_becomes_root_with_warning() {
        let trace = CallTrace::from_records(vec![
            record("root", None, &[], "0xaaa", 100_000),
            record("deep", None, &[2, 1], "0xbbb", 10_000),
        ]);
        let agg = aggregate_call_trace(&trace);

        assert_eq!(agg.call_hierarchy.len(), 2);
        assert_eq!(agg.warnings.len(), 1);
    }

    #[test]
    fn test_gas_attribution_groups_by_callee() {
        let mut failing = record("c1", None, &[1], "0xbbb", 10_000);
        failing.success = false;
        failing.error = Some("reverted".to_string());

        let trace = CallTrace::from_records(vec![
            record("root", None, &[], "0xaaa", 100_000),
            record("c0", Some("root"), &[0], "0xbbb", 30_000),
            failing,
        ]);
        let agg = aggregate_call_trace(&trace);

        let bbb = agg
            .contract_entries
            .iter()
            .find(|e| e.address == "0xbbb")
            .unwrap();
        assert_eq!(bbb.gas_used, 40_000);
        assert_eq!(bbb.call_count, 2);
        assert_eq!(bbb.success_rate, 50.0);
        assert_eq!(bbb.percentage_of_total, 40.0);
    }

    #[test]
    fn test_value_transfers_sorted_descending() {
        let mut a = record("a", None, &[], "0xaaa", 1_000);
        a.value_transferred = 0.5;
        let mut b = record("b", None, &[0], "0xbbb", 1_000);
        b.value_transferred = 2.0;
        let c = record("c", None, &[1], "0xccc", 1_000);

        let agg = aggregate_call_trace(&CallTrace::from_records(vec![a, b, c]));
        assert_eq!(agg.value_transfers.len(), 2);
        assert_eq!(agg.value_transfers[0].value, 2.0);
        assert_eq!(agg.value_transfers[1].value, 0.5);
    }

    #[test]
    fn test_interaction_summary() {
        let mut failing = record("c1", Some("root"), &[1], "0xccc", 10_000);
        failing.success = false;
        failing.error = Some("reverted".to_string());

        let trace = CallTrace::from_records(vec![
            record("root", None, &[], "0xaaa", 100_000),
            record("c0", Some("root"), &[0], "0xbbb", 30_000),
            failing,
            record("c2", Some("root"), &[2], "0xbbb", 5_000),
        ]);
        let agg = aggregate_call_trace(&trace);

        let summary = &agg.interaction;
        assert_eq!(summary.unique_contracts, 3);
        assert_eq!(summary.most_called.as_ref().unwrap().address, "0xbbb");
        assert_eq!(summary.failed_calls, 1);
        assert_eq!(summary.failure_rate, 25.0);
        // 3 contracts * avg depth 0.75 + 1 failure
        assert!((summary.complexity_score - 3.25).abs() < 1e-9);
    }

    #[test]
    fn test_most_called_tie_keeps_first_encountered() {
        let trace = CallTrace::from_records(vec![
            record("r", None, &[], "0xaaa", 1_000),
            record("c0", None, &[0], "0xbbb", 1_000),
            record("c1", None, &[1], "0xaaa", 1_000),
            record("c2", None, &[2], "0xbbb", 1_000),
        ]);
        let agg = aggregate_call_trace(&trace);
        let top = agg.interaction.most_called.unwrap();
        assert_eq!(top.address, "0xaaa");
        assert_eq!(top.call_count, 2);
    }

    #[test]
    fn test_empty_input_yields_empty_outputs() {
        let agg = aggregate_call_trace(&CallTrace::default());
        assert!(agg.contract_entries.is_empty());
        assert!(agg.call_hierarchy.is_empty());
        assert_eq!(agg.total_gas, 0);
        assert_eq!(agg.interaction.complexity_score, 0.0);
    }
}
