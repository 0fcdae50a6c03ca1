//! Configuration constants for the log flow pipeline.

/// Bucket used for events that carry no usable trace id
pub const DEFAULT_MISSING_TRACE_ID: &str = "no-trace";

/// Level assigned when a record has no usable level field
pub const DEFAULT_LEVEL: &str = "INFO";

/// Function name assigned when a record has no usable function field
pub const UNKNOWN_FUNCTION: &str = "?";

// Field names accepted per event attribute (canonical name first, then the
// compact wire abbreviation emitted by size-constrained producers)
pub const TIMESTAMP_FIELD_NAMES: &[&str] = &["timestamp", "ts"];
pub const FUNCTION_FIELD_NAMES: &[&str] = &["function_name", "fn"];
pub const MODULE_FIELD_NAMES: &[&str] = &["module", "mod"];
pub const LEVEL_FIELD_NAMES: &[&str] = &["level", "lvl"];
pub const TRACE_ID_FIELD_NAMES: &[&str] = &["trace_id", "tid"];
pub const DURATION_FIELD_NAMES: &[&str] = &["duration_ms", "ms"];
pub const EXCEPTION_FIELD_NAMES: &[&str] = &["exception", "err"];
pub const EXCEPTION_TYPE_FIELD_NAMES: &[&str] = &["exception_type", "et"];

// Timestamps without a UTC offset are tried against these formats, in order.
// Fractional-second variants come first so sub-second precision survives.
pub const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Format for date-only timestamps (mapped to midnight UTC)
pub const DATE_ONLY_FORMAT: &str = "%Y-%m-%d";

/// First line of every compressed flow summary
pub const COMPRESSION_HEADER: &str = "# nfo Log Flow Compression";

// Default output budgets for the compressor
pub const DEFAULT_MAX_NODES: usize = 60;
pub const DEFAULT_MAX_EDGES: usize = 80;
pub const DEFAULT_MAX_TRACES: usize = 8;
pub const DEFAULT_MAX_EVENTS_PER_TRACE: usize = 12;
