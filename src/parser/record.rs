//! Record shapes admitted into the pipeline.
//!
//! Producers hand us either a typed instrumentation record or a generic
//! string-keyed JSON mapping (canonical or abbreviated field names).
//! Everything else is rejected at this boundary.

use crate::utils::error::ParseError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured record emitted by the nfo instrumentation layer.
///
/// Every field is optional on the wire; absent fields land on their
/// defaults and get resolved during normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogRecord {
    /// Original timestamp text, kept verbatim
    pub timestamp: String,

    /// Log level as emitted (normalization uppercases it)
    pub level: String,

    /// Name of the instrumented function
    pub function_name: String,

    /// Module the function lives in
    pub module: String,

    /// Correlation id shared by all events of one request
    pub trace_id: String,

    /// Wall-clock duration of the call in milliseconds
    pub duration_ms: f64,

    /// Exception message; empty means the call succeeded
    pub exception: String,

    /// Exception class name; informational only
    pub exception_type: String,

    /// Producer-defined extra payload, carried through untouched
    pub extra: Map<String, Value>,
}

/// One input record, in either of the two admitted shapes
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// Typed record from the instrumentation layer
    Entry(LogRecord),
    /// Generic string-keyed mapping
    Fields(Map<String, Value>),
}

impl From<LogRecord> for RecordValue {
    fn from(record: LogRecord) -> Self {
        RecordValue::Entry(record)
    }
}

impl From<Map<String, Value>> for RecordValue {
    fn from(fields: Map<String, Value>) -> Self {
        RecordValue::Fields(fields)
    }
}

impl TryFrom<Value> for RecordValue {
    type Error = ParseError;

    /// Admit a dynamic JSON value; only objects qualify as records
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(RecordValue::Fields(fields)),
            other => Err(ParseError::UnsupportedRecord(value_kind(&other))),
        }
    }
}

/// JSON type name used in admission errors
///
/// **Private** - internal utility
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Admit an array of dynamic values as a record sequence
///
/// **Private** - shared by the builder and compressor input conversions
pub(crate) fn records_from_array(items: Vec<Value>) -> Result<Vec<RecordValue>, ParseError> {
    items.into_iter().map(RecordValue::try_from).collect()
}

/// Admit a mapping of trace id to record array as pre-grouped input
///
/// **Private** - shared by the builder and compressor input conversions
pub(crate) fn grouped_from_map(
    fields: Map<String, Value>,
) -> Result<Vec<(String, Vec<RecordValue>)>, ParseError> {
    let mut buckets = Vec::with_capacity(fields.len());
    for (trace_id, value) in fields {
        match value {
            Value::Array(items) => buckets.push((trace_id, records_from_array(items)?)),
            other => return Err(ParseError::UnsupportedRecord(value_kind(&other))),
        }
    }
    Ok(buckets)
}
