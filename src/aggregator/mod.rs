//! Aggregation of normalized events into traces and flow graphs.
//!
//! This module transforms normalized log events into:
//! - Trace groups (events correlated by trace id, in chronological order)
//! - Flow graphs (function-level nodes and transition edges)
//! - Ranked summaries with deterministic ordering

pub mod grouper;
pub mod graph;
pub mod schema;

// Re-export main types and functions
pub use grouper::TraceGroups;
pub use graph::GraphInput;
pub use schema::{FlowGraph, FlowStats, FlowNode, FlowEdge, TraceFlow};
