//! Budget-bounded text compression for LLM consumption.
//!
//! Renders a flow graph into a fixed-layout Markdown-style digest:
//! - Summary counters
//! - Ranked node and edge lists, truncated per budget
//! - Per-trace timelines with elision markers for omitted rows

use crate::aggregator::graph::GraphInput;
use crate::aggregator::grouper::TraceGroups;
use crate::aggregator::schema::{FlowEdge, FlowGraph, FlowNode, FlowStats, TraceFlow};
use crate::parser::record::{grouped_from_map, records_from_array, value_kind};
use crate::parser::{LogRecord, NormalizedEvent, RecordValue};
use crate::utils::config::{
    COMPRESSION_HEADER, DEFAULT_MAX_EDGES, DEFAULT_MAX_EVENTS_PER_TRACE, DEFAULT_MAX_NODES,
    DEFAULT_MAX_TRACES,
};
use crate::utils::error::ParseError;
use crate::LogFlowParser;
use log::debug;
use serde_json::{Map, Value};

/// Compression budgets
#[derive(Debug, Clone)]
pub struct CompressOptions {
    pub max_nodes: usize,
    pub max_edges: usize,
    pub max_traces: usize,
    pub max_events_per_trace: usize,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
            max_edges: DEFAULT_MAX_EDGES,
            max_traces: DEFAULT_MAX_TRACES,
            max_events_per_trace: DEFAULT_MAX_EVENTS_PER_TRACE,
        }
    }
}

impl CompressOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_max_edges(mut self, max_edges: usize) -> Self {
        self.max_edges = max_edges;
        self
    }

    pub fn with_max_traces(mut self, max_traces: usize) -> Self {
        self.max_traces = max_traces;
        self
    }

    pub fn with_max_events_per_trace(mut self, max_events_per_trace: usize) -> Self {
        self.max_events_per_trace = max_events_per_trace;
        self
    }
}

/// Inputs accepted by the compressor
///
/// A pre-built graph is rendered as-is; records and buckets are first run
/// through the graph builder.
#[derive(Debug, Clone)]
pub enum CompressInput {
    Graph(FlowGraph),
    Records(Vec<RecordValue>),
    Grouped(Vec<(String, Vec<RecordValue>)>),
}

impl From<FlowGraph> for CompressInput {
    fn from(graph: FlowGraph) -> Self {
        CompressInput::Graph(graph)
    }
}

impl From<GraphInput> for CompressInput {
    fn from(input: GraphInput) -> Self {
        match input {
            GraphInput::Records(records) => CompressInput::Records(records),
            GraphInput::Grouped(buckets) => CompressInput::Grouped(buckets),
        }
    }
}

impl From<Vec<RecordValue>> for CompressInput {
    fn from(records: Vec<RecordValue>) -> Self {
        CompressInput::from(GraphInput::from(records))
    }
}

impl From<Vec<LogRecord>> for CompressInput {
    fn from(records: Vec<LogRecord>) -> Self {
        CompressInput::from(GraphInput::from(records))
    }
}

impl From<Vec<Map<String, Value>>> for CompressInput {
    fn from(records: Vec<Map<String, Value>>) -> Self {
        CompressInput::from(GraphInput::from(records))
    }
}

impl From<Vec<NormalizedEvent>> for CompressInput {
    fn from(events: Vec<NormalizedEvent>) -> Self {
        CompressInput::from(GraphInput::from(events))
    }
}

impl From<Vec<(String, Vec<RecordValue>)>> for CompressInput {
    fn from(buckets: Vec<(String, Vec<RecordValue>)>) -> Self {
        CompressInput::Grouped(buckets)
    }
}

impl From<TraceGroups> for CompressInput {
    fn from(groups: TraceGroups) -> Self {
        CompressInput::from(GraphInput::from(groups))
    }
}

impl TryFrom<Value> for CompressInput {
    type Error = ParseError;

    /// Admit a dynamic value. An object carrying the `stats`, `nodes`, and
    /// `edges` keys is treated as a serialized graph; any other object is a
    /// pre-grouped mapping, and an array is a record sequence.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => {
                if fields.contains_key("stats")
                    && fields.contains_key("nodes")
                    && fields.contains_key("edges")
                {
                    let graph: FlowGraph = serde_json::from_value(Value::Object(fields))
                        .map_err(|e| ParseError::InvalidGraph(e.to_string()))?;
                    Ok(CompressInput::Graph(graph))
                } else {
                    Ok(CompressInput::Grouped(grouped_from_map(fields)?))
                }
            }
            Value::Array(items) => Ok(CompressInput::Records(records_from_array(items)?)),
            other => Err(ParseError::UnsupportedRecord(value_kind(&other))),
        }
    }
}

impl LogFlowParser {
    /// Compress flow data into an LLM-friendly textual summary
    ///
    /// **Public** - main entry point for text compression; total, never fails
    ///
    /// # Arguments
    /// * `input` - A pre-built graph, a flat record sequence, or bucketed records
    /// * `options` - Budgets bounding each section of the output
    ///
    /// # Returns
    /// The rendered digest, newline-joined without a trailing newline
    pub fn compress_for_llm(
        &self,
        input: impl Into<CompressInput>,
        options: &CompressOptions,
    ) -> String {
        let graph = match input.into() {
            CompressInput::Graph(graph) => graph,
            CompressInput::Records(records) => self.build_flow_graph(records),
            CompressInput::Grouped(buckets) => self.build_flow_graph(buckets),
        };
        render_graph(&graph, options)
    }
}

/// Render a graph into the fixed digest layout
///
/// **Private** - internal to the compressor
fn render_graph(graph: &FlowGraph, options: &CompressOptions) -> String {
    let mut lines: Vec<String> = Vec::new();

    render_summary(&graph.stats, &mut lines);
    render_top_nodes(&graph.nodes, options.max_nodes, &mut lines);
    render_top_edges(&graph.edges, options.max_edges, &mut lines);
    render_trace_timelines(&graph.traces, options, &mut lines);

    debug!("Compressed flow graph into {} lines", lines.len());

    lines.join("\n")
}

fn render_summary(stats: &FlowStats, lines: &mut Vec<String>) {
    lines.push(COMPRESSION_HEADER.to_string());
    lines.push("## Summary".to_string());
    lines.push(format!("- traces: {}", stats.trace_count));
    lines.push(format!("- events: {}", stats.event_count));
    lines.push(format!("- nodes: {}", stats.node_count));
    lines.push(format!("- edges: {}", stats.edge_count));
    lines.push(format!("- errors: {}", stats.error_count));
}

fn render_top_nodes(nodes: &[FlowNode], max_nodes: usize, lines: &mut Vec<String>) {
    lines.push(String::new());
    lines.push("## Top Nodes".to_string());
    for node in nodes.iter().take(max_nodes) {
        lines.push(format!(
            "- {}: calls={}, errors={}, avg_ms={}",
            node.id, node.calls, node.errors, node.avg_duration_ms
        ));
    }
    if nodes.len() > max_nodes {
        lines.push(format!("- ... {} more nodes", nodes.len() - max_nodes));
    }
}

fn render_top_edges(edges: &[FlowEdge], max_edges: usize, lines: &mut Vec<String>) {
    lines.push(String::new());
    lines.push("## Top Edges".to_string());
    for edge in edges.iter().take(max_edges) {
        lines.push(format!(
            "- {} -> {}: count={}, error_count={}",
            edge.source, edge.target, edge.count, edge.error_count
        ));
    }
    if edges.len() > max_edges {
        lines.push(format!("- ... {} more edges", edges.len() - max_edges));
    }
}

fn render_trace_timelines(traces: &[TraceFlow], options: &CompressOptions, lines: &mut Vec<String>) {
    lines.push(String::new());
    lines.push("## Trace Timelines".to_string());
    for trace in traces.iter().take(options.max_traces) {
        lines.push(format!(
            "### trace_id={} (events={}, errors={})",
            trace.trace_id, trace.event_count, trace.error_count
        ));

        for event in trace.events.iter().take(options.max_events_per_trace) {
            lines.push(render_timeline_row(event));
        }

        if trace.event_count > options.max_events_per_trace {
            lines.push(format!(
                "- ... {} more events in this trace",
                trace.event_count - options.max_events_per_trace
            ));
        }
    }
    if traces.len() > options.max_traces {
        lines.push(format!("- ... {} more traces", traces.len() - options.max_traces));
    }
}

/// One timeline row: timestamp, status, node, duration, optional error type
fn render_timeline_row(event: &NormalizedEvent) -> String {
    let status = if event.has_error() { "ERR" } else { "OK" };
    let ts = if event.timestamp.is_empty() {
        "unknown-ts"
    } else {
        event.timestamp.as_str()
    };

    let mut row = format!(
        "- {} | {} | {} | {:.2}ms",
        ts, status, event.node, event.duration_ms
    );
    if !event.exception_type.is_empty() {
        row.push_str(&format!(" | {}", event.exception_type));
    }
    row
}
