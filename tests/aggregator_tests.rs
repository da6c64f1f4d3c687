use gas_trace_studio::aggregator::{aggregate_call_trace, aggregate_struct_log};
use gas_trace_studio::categorizer::OpcodeCategory;
use gas_trace_studio::parser::schema::{CallRecord, CallTrace, StructLogTrace, TraceStep};

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

fn call(id: &str, parent: Option<&str>, path: &[u32], to: &str, gas: u64) -> CallRecord {
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
fn test_categorization_partitions_all_gas() {
    let trace = StructLogTrace::from_steps(vec![
        step(0, "SSTORE", 20_000),
        step(1, "SSTORE", 20_000),
        step(2, "ADD", 3),
    ]);
    let agg = aggregate_struct_log(&trace);

    // Category totals are a total partition of step gas
    let summed: u64 = agg.category_totals.iter().map(|c| c.gas_used).sum();
    assert_eq!(summed, 40_003);

    let storage = agg
        .category_totals
        .iter()
        .find(|c| c.category == OpcodeCategory::Storage)
        .unwrap();
    assert_eq!(storage.gas_used, 40_000);
    assert!((storage.percentage_of_total - 99.99).abs() < 0.01);

    let computation = agg
        .category_totals
        .iter()
        .find(|c| c.category == OpcodeCategory::Computation)
        .unwrap();
    assert_eq!(computation.gas_used, 3);
    assert!((computation.percentage_of_total - 0.01).abs() < 0.01);
}

#[test]
fn test_timeline_matches_prefix_sums() {
    let gas_costs = [3u64, 5, 20_000, 0, 2_100, 8];
    let steps: Vec<TraceStep> = gas_costs
        .iter()
        .enumerate()
        .map(|(i, &gas)| step(i as u64, "MLOAD", gas))
        .collect();
    let agg = aggregate_struct_log(&StructLogTrace::from_steps(steps));

    let mut expected = 0u64;
    for (i, point) in agg.execution_timeline.iter().enumerate() {
        expected += gas_costs[i];
        assert_eq!(point.cumulative_gas, expected);
    }
}

#[test]
fn test_percentages_sum_to_one_hundred() {
    let trace = StructLogTrace::from_steps(vec![
        step(0, "SSTORE", 7_000),
        step(1, "MLOAD", 1_200),
        step(2, "CALL", 700),
        step(3, "KECCAK256", 36),
        step(4, "JUMPI", 10),
    ]);
    let agg = aggregate_struct_log(&trace);

    let summed: f64 = agg
        .category_totals
        .iter()
        .map(|c| c.percentage_of_total)
        .sum();
    assert!((summed - 100.0).abs() < 1e-9);
}

#[test]
fn test_orphaned_child_becomes_second_root() {
    // One root and one child whose parentId does not resolve:
    // the forest has two roots and one warning, no fatal error
    let trace = CallTrace::from_records(vec![
        call("root", None, &[], "0xaaa", 100_000),
        call("child", Some("missing"), &[0], "0xbbb", 30_000),
    ]);
    let agg = aggregate_call_trace(&trace);

    assert_eq!(agg.call_hierarchy.len(), 2);
    assert_eq!(agg.warnings.len(), 1);
}

#[test]
fn test_every_non_root_attaches_to_exactly_one_parent() {
    let trace = CallTrace::from_records(vec![
        call("root", None, &[], "0xaaa", 100_000),
        call("a", Some("root"), &[0], "0xbbb", 10_000),
        call("b", Some("root"), &[1], "0xccc", 10_000),
        call("a0", Some("a"), &[0, 0], "0xddd", 1_000),
        call("a1", Some("a"), &[0, 1], "0xeee", 1_000),
    ]);
    let agg = aggregate_call_trace(&trace);

    assert_eq!(agg.call_hierarchy.len(), 1);
    fn count_nodes(node: &gas_trace_studio::model::schema::CallNode) -> usize {
        1 + node.children.iter().map(count_nodes).sum::<usize>()
    }
    assert_eq!(count_nodes(&agg.call_hierarchy[0]), 5);
    assert!(agg.warnings.is_empty());
}

#[test]
fn test_success_rate_guarded_for_grouped_entries() {
    let mut failing = call("c1", None, &[0], "0xbbb", 10_000);
    failing.success = false;
    failing.error = Some("reverted".to_string());

    let trace = CallTrace::from_records(vec![call("root", None, &[], "0xaaa", 50_000), failing]);
    let agg = aggregate_call_trace(&trace);

    for entry in &agg.contract_entries {
        assert!(entry.success_rate.is_finite());
        assert!(entry.success_rate >= 0.0 && entry.success_rate <= 100.0);
    }
}
