//! Flow graph schema definitions.
//!
//! This module defines the structure of the graph handed to JSON consumers
//! and to the compressor. Field names are a public contract; defaults let a
//! partially-populated graph value load cleanly.

use crate::parser::NormalizedEvent;
use serde::{Deserialize, Serialize};

/// Top-level flow graph synthesized from correlated events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowGraph {
    /// Aggregate counters across the whole graph
    pub stats: FlowStats,

    /// Function-level nodes, busiest first
    pub nodes: Vec<FlowNode>,

    /// Directed transitions between nodes, most traveled first
    pub edges: Vec<FlowEdge>,

    /// Per-trace timelines, largest trace first
    pub traces: Vec<TraceFlow>,
}

/// Aggregate counters for a built graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowStats {
    pub trace_count: usize,
    pub event_count: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub error_count: usize,
}

/// One function-level node with its aggregates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowNode {
    /// Node id: `module.function_name`, or the bare function name
    pub id: String,

    pub module: String,
    pub function_name: String,

    /// Events observed at this node
    pub calls: usize,

    /// Events at this node that carried an exception
    pub errors: usize,

    /// Summed duration across calls, rounded to 3 decimal places
    pub total_duration_ms: f64,

    /// Mean duration per call, rounded to 3 decimal places
    pub avg_duration_ms: f64,

    /// Sorted ids of every trace that touched this node
    pub trace_ids: Vec<String>,
}

/// A directed transition between two consecutive events of one trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowEdge {
    pub source: String,
    pub target: String,

    /// Times this transition was observed
    pub count: usize,

    /// Observations whose target event carried an exception
    pub error_count: usize,

    /// Sorted ids of every trace that traveled this edge
    pub trace_ids: Vec<String>,
}

/// Timeline summary for a single trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceFlow {
    pub trace_id: String,
    pub event_count: usize,
    pub error_count: usize,

    /// Verbatim timestamp of the first event; empty for an empty trace
    pub start_timestamp: String,

    /// Verbatim timestamp of the last event; empty for an empty trace
    pub end_timestamp: String,

    /// Full normalized events in chronological order
    pub events: Vec<NormalizedEvent>,
}
