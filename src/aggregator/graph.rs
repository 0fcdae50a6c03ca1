//! Flow graph synthesis from correlated events.
//!
//! Each trace is walked in chronological order: every event lands on a
//! function-level node, and every consecutive pair of events produces a
//! directed edge. Aggregates accumulate in hash maps during the walk and
//! are ranked deterministically at the end.

use super::grouper::{chronological_cmp, trace_rank_cmp, TraceGroups};
use super::schema::{FlowEdge, FlowGraph, FlowNode, FlowStats, TraceFlow};
use crate::parser::record::{grouped_from_map, records_from_array, value_kind};
use crate::parser::{LogRecord, NormalizedEvent, RecordValue};
use crate::utils::error::ParseError;
use crate::LogFlowParser;
use log::debug;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Inputs accepted by the graph builder
#[derive(Debug, Clone)]
pub enum GraphInput {
    /// Flat record sequence; each record is bucketed by its own trace id
    Records(Vec<RecordValue>),
    /// Caller-bucketed records; bucket keys are authoritative and events
    /// are never re-bucketed, but each bucket is re-sorted chronologically
    Grouped(Vec<(String, Vec<RecordValue>)>),
}

impl From<Vec<RecordValue>> for GraphInput {
    fn from(records: Vec<RecordValue>) -> Self {
        GraphInput::Records(records)
    }
}

impl From<Vec<LogRecord>> for GraphInput {
    fn from(records: Vec<LogRecord>) -> Self {
        GraphInput::Records(records.into_iter().map(RecordValue::from).collect())
    }
}

impl From<Vec<Map<String, Value>>> for GraphInput {
    fn from(records: Vec<Map<String, Value>>) -> Self {
        GraphInput::Records(records.into_iter().map(RecordValue::from).collect())
    }
}

impl From<Vec<NormalizedEvent>> for GraphInput {
    fn from(events: Vec<NormalizedEvent>) -> Self {
        GraphInput::Records(events.into_iter().map(RecordValue::from).collect())
    }
}

impl From<Vec<(String, Vec<RecordValue>)>> for GraphInput {
    fn from(buckets: Vec<(String, Vec<RecordValue>)>) -> Self {
        GraphInput::Grouped(buckets)
    }
}

impl From<TraceGroups> for GraphInput {
    fn from(groups: TraceGroups) -> Self {
        GraphInput::Grouped(
            groups
                .into_iter()
                .map(|(trace_id, events)| {
                    (
                        trace_id,
                        events.into_iter().map(RecordValue::from).collect(),
                    )
                })
                .collect(),
        )
    }
}

impl TryFrom<Value> for GraphInput {
    type Error = ParseError;

    /// Admit a dynamic value: an object is a pre-grouped mapping, an array
    /// is a record sequence
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(GraphInput::Grouped(grouped_from_map(fields)?)),
            Value::Array(items) => Ok(GraphInput::Records(records_from_array(items)?)),
            other => Err(ParseError::UnsupportedRecord(value_kind(&other))),
        }
    }
}

impl LogFlowParser {
    /// Build the flow graph for a batch of records
    ///
    /// **Public** - main entry point for graph synthesis; total, never fails
    ///
    /// # Arguments
    /// * `input` - A flat record sequence or caller-bucketed records
    ///
    /// # Returns
    /// The graph with ranked nodes, edges, and per-trace timelines
    pub fn build_flow_graph(&self, input: impl Into<GraphInput>) -> FlowGraph {
        let groups: Vec<(String, Vec<NormalizedEvent>)> = match input.into() {
            GraphInput::Records(records) => self.group_by_trace(records).into_iter().collect(),
            GraphInput::Grouped(buckets) => buckets
                .into_iter()
                .map(|(trace_id, records)| {
                    let mut events: Vec<NormalizedEvent> =
                        records.iter().map(|record| self.normalize(record)).collect();
                    events.sort_by(chronological_cmp);
                    (trace_id, events)
                })
                .collect(),
        };

        assemble_graph(groups)
    }
}

/// Walk grouped events into ranked nodes, edges, and trace summaries
///
/// **Private** - internal to the builder
fn assemble_graph(groups: Vec<(String, Vec<NormalizedEvent>)>) -> FlowGraph {
    let mut node_accs: HashMap<String, NodeAcc> = HashMap::new();
    let mut edge_accs: HashMap<(String, String), EdgeAcc> = HashMap::new();
    let mut traces: Vec<TraceFlow> = Vec::with_capacity(groups.len());
    let mut event_count = 0usize;
    let mut error_count = 0usize;

    for (trace_id, events) in &groups {
        let mut trace_errors = 0usize;
        let mut previous: Option<&str> = None;

        for event in events {
            event_count += 1;
            let failed = event.has_error();
            if failed {
                error_count += 1;
                trace_errors += 1;
            }

            let node = node_accs
                .entry(event.node.clone())
                .or_insert_with(|| NodeAcc::new(&event.module, &event.function_name));
            node.calls += 1;
            if failed {
                node.errors += 1;
            }
            node.total_duration_ms += event.duration_ms;
            node.trace_ids.insert(trace_id.clone());

            if let Some(source) = previous {
                let edge = edge_accs
                    .entry((source.to_string(), event.node.clone()))
                    .or_default();
                edge.count += 1;
                if failed {
                    // Errors belong to the edge leading INTO the failing event
                    edge.error_count += 1;
                }
                edge.trace_ids.insert(trace_id.clone());
            }
            previous = Some(event.node.as_str());
        }

        traces.push(TraceFlow {
            trace_id: trace_id.clone(),
            event_count: events.len(),
            error_count: trace_errors,
            start_timestamp: events
                .first()
                .map(|event| event.timestamp.clone())
                .unwrap_or_default(),
            end_timestamp: events
                .last()
                .map(|event| event.timestamp.clone())
                .unwrap_or_default(),
            events: events.clone(),
        });
    }

    let mut nodes: Vec<FlowNode> = node_accs
        .into_iter()
        .map(|(id, acc)| acc.into_row(id))
        .collect();
    nodes.sort_by(|a, b| {
        b.calls
            .cmp(&a.calls)
            .then_with(|| b.errors.cmp(&a.errors))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut edges: Vec<FlowEdge> = edge_accs
        .into_iter()
        .map(|((source, target), acc)| acc.into_row(source, target))
        .collect();
    edges.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.error_count.cmp(&a.error_count))
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.target.cmp(&b.target))
    });

    traces.sort_by(|a, b| {
        trace_rank_cmp(
            (a.trace_id.as_str(), a.event_count),
            (b.trace_id.as_str(), b.event_count),
        )
    });

    let stats = FlowStats {
        trace_count: groups.len(),
        event_count,
        node_count: nodes.len(),
        edge_count: edges.len(),
        error_count,
    };

    debug!(
        "Built flow graph: {} nodes, {} edges, {} traces, {} errors",
        stats.node_count, stats.edge_count, stats.trace_count, stats.error_count
    );

    FlowGraph {
        stats,
        nodes,
        edges,
        traces,
    }
}

/// Per-node accumulator used during the walk
struct NodeAcc {
    module: String,
    function_name: String,
    calls: usize,
    errors: usize,
    total_duration_ms: f64,
    trace_ids: HashSet<String>,
}

impl NodeAcc {
    fn new(module: &str, function_name: &str) -> Self {
        Self {
            module: module.to_string(),
            function_name: function_name.to_string(),
            calls: 0,
            errors: 0,
            total_duration_ms: 0.0,
            trace_ids: HashSet::new(),
        }
    }

    fn into_row(self, id: String) -> FlowNode {
        // calls is always at least 1 here, but guard the division anyway
        let calls = self.calls.max(1);
        FlowNode {
            id,
            module: self.module,
            function_name: self.function_name,
            calls: self.calls,
            errors: self.errors,
            total_duration_ms: round3(self.total_duration_ms),
            avg_duration_ms: round3(self.total_duration_ms / calls as f64),
            trace_ids: sorted_members(self.trace_ids),
        }
    }
}

/// Per-edge accumulator used during the walk
#[derive(Default)]
struct EdgeAcc {
    count: usize,
    error_count: usize,
    trace_ids: HashSet<String>,
}

impl EdgeAcc {
    fn into_row(self, source: String, target: String) -> FlowEdge {
        FlowEdge {
            source,
            target,
            count: self.count,
            error_count: self.error_count,
            trace_ids: sorted_members(self.trace_ids),
        }
    }
}

/// Membership stays a hash set during the walk and is ordered exactly once
fn sorted_members(ids: HashSet<String>) -> Vec<String> {
    let mut members: Vec<String> = ids.into_iter().collect();
    members.sort();
    members
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn three_step_trace() -> Vec<Map<String, Value>> {
        vec![
            record(json!({
                "ts": "2026-02-15T10:00:00Z", "fn": "start", "mod": "svc",
                "tid": "t-1", "ms": 1.0
            })),
            record(json!({
                "ts": "2026-02-15T10:00:01Z", "fn": "process", "mod": "svc",
                "tid": "t-1", "ms": 2.0, "err": "boom", "et": "ValueError"
            })),
            record(json!({
                "ts": "2026-02-15T10:00:02Z", "fn": "finish", "mod": "svc",
                "tid": "t-1", "ms": 3.0
            })),
        ]
    }

    #[test]
    fn test_single_trace_graph_shape() {
        let graph = LogFlowParser::new().build_flow_graph(three_step_trace());

        assert_eq!(graph.stats.trace_count, 1);
        assert_eq!(graph.stats.event_count, 3);
        assert_eq!(graph.stats.node_count, 3);
        assert_eq!(graph.stats.edge_count, 2);
        assert_eq!(graph.stats.error_count, 1);

        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert!(ids.contains(&"svc.start"));
        assert!(ids.contains(&"svc.process"));
        assert!(ids.contains(&"svc.finish"));
    }

    #[test]
    fn test_edge_error_attributed_to_target() {
        let graph = LogFlowParser::new().build_flow_graph(three_step_trace());

        let into_failure = graph
            .edges
            .iter()
            .find(|e| e.source == "svc.start" && e.target == "svc.process")
            .unwrap();
        assert_eq!(into_failure.count, 1);
        assert_eq!(into_failure.error_count, 1);

        // The edge OUT of the failing event carries no error
        let out_of_failure = graph
            .edges
            .iter()
            .find(|e| e.source == "svc.process" && e.target == "svc.finish")
            .unwrap();
        assert_eq!(out_of_failure.count, 1);
        assert_eq!(out_of_failure.error_count, 0);
    }

    #[test]
    fn test_node_aggregates_and_rounding() {
        let parser = LogFlowParser::new();
        let records = vec![
            record(json!({"fn": "f", "mod": "m", "tid": "a", "ms": 1.0005})),
            record(json!({"fn": "f", "mod": "m", "tid": "b", "ms": 2.0})),
            record(json!({"fn": "f", "mod": "m", "tid": "a", "ms": 3.0, "err": "x"})),
        ];

        let graph = parser.build_flow_graph(records);
        assert_eq!(graph.nodes.len(), 1);

        let node = &graph.nodes[0];
        assert_eq!(node.id, "m.f");
        assert_eq!(node.calls, 3);
        assert_eq!(node.errors, 1);
        assert_eq!(node.total_duration_ms, 6.001);
        assert_eq!(node.avg_duration_ms, 2.0);
        assert_eq!(node.trace_ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_node_ranking() {
        let parser = LogFlowParser::new();
        let records = vec![
            record(json!({"fn": "busy", "tid": "t"})),
            record(json!({"fn": "busy", "tid": "t"})),
            record(json!({"fn": "erring", "tid": "t", "err": "x"})),
            record(json!({"fn": "calm", "tid": "t"})),
        ];

        let graph = parser.build_flow_graph(records);
        let order: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        // calls desc, then errors desc, then id asc
        assert_eq!(order, vec!["busy", "erring", "calm"]);
    }

    #[test]
    fn test_self_loop_edge() {
        let parser = LogFlowParser::new();
        let records = vec![
            record(json!({"ts": "2026-02-15T10:00:00Z", "fn": "retry", "tid": "t"})),
            record(json!({"ts": "2026-02-15T10:00:01Z", "fn": "retry", "tid": "t"})),
        ];

        let graph = parser.build_flow_graph(records);
        assert_eq!(graph.stats.node_count, 1);
        assert_eq!(graph.stats.edge_count, 1);
        assert_eq!(graph.edges[0].source, "retry");
        assert_eq!(graph.edges[0].target, "retry");
        assert_eq!(graph.edges[0].count, 1);
    }

    #[test]
    fn test_single_event_trace_has_no_edges() {
        let graph =
            LogFlowParser::new().build_flow_graph(vec![record(json!({"fn": "solo", "tid": "t"}))]);
        assert_eq!(graph.stats.node_count, 1);
        assert_eq!(graph.stats.edge_count, 0);
    }

    #[test]
    fn test_grouped_input_keeps_bucket_keys() {
        let parser = LogFlowParser::new();
        // The record claims trace "other" but lives in bucket "kept"
        let buckets = vec![(
            "kept".to_string(),
            vec![RecordValue::from(record(json!({"fn": "f", "tid": "other"})))],
        )];

        let graph = parser.build_flow_graph(buckets);
        assert_eq!(graph.traces.len(), 1);
        assert_eq!(graph.traces[0].trace_id, "kept");
        assert_eq!(graph.nodes[0].trace_ids, vec!["kept".to_string()]);
    }

    #[test]
    fn test_grouped_input_resorts_events() {
        let parser = LogFlowParser::new();
        let buckets = vec![(
            "t".to_string(),
            vec![
                RecordValue::from(record(json!({"ts": "2026-02-15T10:00:02Z", "fn": "second"}))),
                RecordValue::from(record(json!({"ts": "2026-02-15T10:00:01Z", "fn": "first"}))),
            ],
        )];

        let graph = parser.build_flow_graph(buckets);
        let events = &graph.traces[0].events;
        assert_eq!(events[0].function_name, "first");
        assert_eq!(events[1].function_name, "second");
        assert_eq!(graph.edges[0].source, "first");
        assert_eq!(graph.edges[0].target, "second");
    }

    #[test]
    fn test_empty_grouped_bucket_still_counts_as_trace() {
        let parser = LogFlowParser::new();
        let buckets: Vec<(String, Vec<RecordValue>)> = vec![("empty".to_string(), Vec::new())];

        let graph = parser.build_flow_graph(buckets);
        assert_eq!(graph.stats.trace_count, 1);
        assert_eq!(graph.stats.event_count, 0);
        assert_eq!(graph.traces[0].event_count, 0);
        assert_eq!(graph.traces[0].start_timestamp, "");
        assert_eq!(graph.traces[0].end_timestamp, "");
    }

    #[test]
    fn test_trace_timestamps_span_first_and_last() {
        let graph = LogFlowParser::new().build_flow_graph(three_step_trace());
        let trace = &graph.traces[0];
        assert_eq!(trace.start_timestamp, "2026-02-15T10:00:00Z");
        assert_eq!(trace.end_timestamp, "2026-02-15T10:00:02Z");
        assert_eq!(trace.error_count, 1);
    }

    #[test]
    fn test_graph_input_from_dynamic_value() {
        let parser = LogFlowParser::new();

        let input = GraphInput::try_from(json!([{"fn": "a", "tid": "t"}])).unwrap();
        let graph = parser.build_flow_graph(input);
        assert_eq!(graph.stats.event_count, 1);

        let input = GraphInput::try_from(json!({"t": [{"fn": "a"}]})).unwrap();
        let graph = parser.build_flow_graph(input);
        assert_eq!(graph.stats.trace_count, 1);

        assert!(GraphInput::try_from(json!("nope")).is_err());
    }
}
