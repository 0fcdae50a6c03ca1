//! nfo Log Flow
//!
//! Trace-aware flow graphs and LLM-ready compression for nfo
//! structured logs.
//!
//! The pipeline ingests JSON-Lines log streams, normalizes each record
//! into a canonical event, correlates events into traces by trace id,
//! synthesizes a flow graph of function-level nodes and transition
//! edges, and compresses the result into a budget-bounded text digest
//! suitable for an LLM prompt.
//!
//! ## Getting Started
//!
//! ```
//! use nfo_flow::{CompressOptions, LogFlowParser};
//!
//! let parser = LogFlowParser::new();
//! let events = parser.parse_jsonl(
//!     r#"{"fn": "handler", "mod": "api", "tid": "req-1"}"#,
//!     false,
//! )?;
//!
//! let graph = parser.build_flow_graph(events);
//! assert_eq!(graph.stats.trace_count, 1);
//! assert_eq!(graph.nodes[0].id, "api.handler");
//!
//! let digest = parser.compress_for_llm(graph, &CompressOptions::default());
//! assert!(digest.starts_with("# nfo Log Flow Compression"));
//! # Ok::<(), nfo_flow::ParseError>(())
//! ```

pub mod aggregator;
pub mod output;
pub mod parser;
pub mod utils;

// Re-export main types
pub use aggregator::{FlowEdge, FlowGraph, FlowNode, FlowStats, GraphInput, TraceFlow, TraceGroups};
pub use output::{CompressInput, CompressOptions};
pub use parser::{LogRecord, LogSource, NormalizedEvent, RecordValue};
pub use utils::ParseError;

use utils::config::DEFAULT_MISSING_TRACE_ID;

/// Parser facade holding normalization settings
///
/// Operation entry points live in the modules that own them: ingestion in
/// [`parser`], grouping and graph building in [`aggregator`], compression
/// in [`output`].
#[derive(Debug, Clone)]
pub struct LogFlowParser {
    missing_trace_id: String,
}

impl Default for LogFlowParser {
    fn default() -> Self {
        Self {
            missing_trace_id: DEFAULT_MISSING_TRACE_ID.to_string(),
        }
    }
}

impl LogFlowParser {
    /// Create a parser with the default missing-trace sentinel
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with a custom sentinel for events without a trace id
    pub fn with_missing_trace_id(missing_trace_id: impl Into<String>) -> Self {
        Self {
            missing_trace_id: missing_trace_id.into(),
        }
    }

    /// The sentinel assigned to events without a usable trace id
    pub fn missing_trace_id(&self) -> &str {
        &self.missing_trace_id
    }
}

/// Build a flow graph without manual parser setup
pub fn build_log_flow_graph(input: impl Into<GraphInput>) -> FlowGraph {
    LogFlowParser::new().build_flow_graph(input)
}

/// Compress flow data into an LLM-ready digest without manual parser setup
pub fn compress_logs_for_llm(
    input: impl Into<CompressInput>,
    options: &CompressOptions,
) -> String {
    LogFlowParser::new().compress_for_llm(input, options)
}
