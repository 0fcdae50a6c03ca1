//! Normalization of heterogeneous log records into canonical events.
//!
//! Producers disagree on field names (full names vs. compact abbreviations),
//! on which fields are present, and on value types. Normalization resolves
//! all of that into one fixed event schema so the rest of the pipeline never
//! has to look at raw input again.

use super::record::{value_kind, LogRecord, RecordValue};
use crate::utils::config::{
    DATE_ONLY_FORMAT, DEFAULT_LEVEL, DURATION_FIELD_NAMES, EXCEPTION_FIELD_NAMES,
    EXCEPTION_TYPE_FIELD_NAMES, FUNCTION_FIELD_NAMES, LEVEL_FIELD_NAMES, MODULE_FIELD_NAMES,
    NAIVE_TIMESTAMP_FORMATS, TIMESTAMP_FIELD_NAMES, TRACE_ID_FIELD_NAMES, UNKNOWN_FUNCTION,
};
use crate::utils::error::ParseError;
use crate::LogFlowParser;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A log event in the canonical schema shared by every pipeline stage.
///
/// Serialized field names are a public contract; graph consumers and the
/// compressor both read them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizedEvent {
    /// Timestamp exactly as the producer wrote it
    pub timestamp: String,

    /// Seconds since the epoch derived from `timestamp`; 0.0 when unparsable
    pub sort_key: f64,

    /// Correlation id, or the configured sentinel
    pub trace_id: String,

    /// Function name, `?` when the record had none
    pub function_name: String,

    /// Module name, empty when the record had none
    pub module: String,

    /// Graph node id: `module.function_name`, or the bare function name
    pub node: String,

    /// Uppercased level, `INFO` by default
    pub level: String,

    /// Call duration in milliseconds, 0.0 when absent or junk
    pub duration_ms: f64,

    /// Exception message; non-empty marks the event as failed
    pub exception: String,

    /// Exception class name, informational only
    pub exception_type: String,

    /// Producer extras, carried verbatim
    pub extra: Map<String, Value>,
}

impl NormalizedEvent {
    /// Whether this event records a failure
    ///
    /// Only `exception` counts; `exception_type` alone never flags an error.
    pub fn has_error(&self) -> bool {
        !self.exception.is_empty()
    }

    /// Re-expose the event as a plain field mapping
    ///
    /// **Public** - lets normalized output feed back into any pipeline stage
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("timestamp".to_string(), Value::String(self.timestamp.clone()));
        fields.insert("sort_key".to_string(), Value::from(self.sort_key));
        fields.insert("trace_id".to_string(), Value::String(self.trace_id.clone()));
        fields.insert(
            "function_name".to_string(),
            Value::String(self.function_name.clone()),
        );
        fields.insert("module".to_string(), Value::String(self.module.clone()));
        fields.insert("node".to_string(), Value::String(self.node.clone()));
        fields.insert("level".to_string(), Value::String(self.level.clone()));
        fields.insert("duration_ms".to_string(), Value::from(self.duration_ms));
        fields.insert("exception".to_string(), Value::String(self.exception.clone()));
        fields.insert(
            "exception_type".to_string(),
            Value::String(self.exception_type.clone()),
        );
        fields.insert("extra".to_string(), Value::Object(self.extra.clone()));
        fields
    }
}

impl From<NormalizedEvent> for RecordValue {
    fn from(event: NormalizedEvent) -> Self {
        RecordValue::Fields(event.to_fields())
    }
}

impl From<&NormalizedEvent> for RecordValue {
    fn from(event: &NormalizedEvent) -> Self {
        RecordValue::Fields(event.to_fields())
    }
}

impl LogFlowParser {
    /// Normalize one admitted record into the canonical event schema
    ///
    /// **Public** - main entry point for normalization; total, never fails
    pub fn normalize(&self, record: &RecordValue) -> NormalizedEvent {
        match record {
            RecordValue::Entry(entry) => self.normalize_entry(entry),
            RecordValue::Fields(fields) => self.normalize_fields(fields),
        }
    }

    /// Normalize a dynamic JSON value, rejecting anything but an object
    ///
    /// # Errors
    /// * `ParseError::UnsupportedRecord` - the value is not a JSON object
    pub fn normalize_value(&self, value: &Value) -> Result<NormalizedEvent, ParseError> {
        match value {
            Value::Object(fields) => Ok(self.normalize_fields(fields)),
            other => Err(ParseError::UnsupportedRecord(value_kind(other))),
        }
    }

    /// Normalize a typed instrumentation record
    ///
    /// **Private** - per-variant path for `normalize`
    pub(crate) fn normalize_entry(&self, entry: &LogRecord) -> NormalizedEvent {
        let function_name = if entry.function_name.is_empty() {
            UNKNOWN_FUNCTION.to_string()
        } else {
            entry.function_name.clone()
        };
        let level = if entry.level.is_empty() {
            DEFAULT_LEVEL.to_string()
        } else {
            entry.level.to_uppercase()
        };
        let primary_trace = if entry.trace_id.is_empty() {
            None
        } else {
            Some(entry.trace_id.clone())
        };
        let trace_id = self.resolve_trace_id(primary_trace, &entry.extra);

        let node = join_node(&entry.module, &function_name);
        let sort_key = timestamp_sort_key(&entry.timestamp);

        NormalizedEvent {
            timestamp: entry.timestamp.clone(),
            sort_key,
            trace_id,
            function_name,
            module: entry.module.clone(),
            node,
            level,
            duration_ms: entry.duration_ms,
            exception: entry.exception.clone(),
            exception_type: entry.exception_type.clone(),
            extra: entry.extra.clone(),
        }
    }

    /// Normalize a generic string-keyed mapping
    ///
    /// **Private** - per-variant path for `normalize`, also used by ingestion
    pub(crate) fn normalize_fields(&self, fields: &Map<String, Value>) -> NormalizedEvent {
        let extra = match fields.get("extra") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };

        let timestamp = string_field(fields, TIMESTAMP_FIELD_NAMES).unwrap_or_default();
        let function_name = string_field(fields, FUNCTION_FIELD_NAMES)
            .unwrap_or_else(|| UNKNOWN_FUNCTION.to_string());
        let module = string_field(fields, MODULE_FIELD_NAMES).unwrap_or_default();
        let level = string_field(fields, LEVEL_FIELD_NAMES)
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
            .to_uppercase();
        let trace_id = self.resolve_trace_id(string_field(fields, TRACE_ID_FIELD_NAMES), &extra);
        let exception = string_field(fields, EXCEPTION_FIELD_NAMES).unwrap_or_default();
        let exception_type = string_field(fields, EXCEPTION_TYPE_FIELD_NAMES).unwrap_or_default();
        let duration_ms = duration_field(fields);

        let node = join_node(&module, &function_name);
        let sort_key = timestamp_sort_key(&timestamp);

        NormalizedEvent {
            timestamp,
            sort_key,
            trace_id,
            function_name,
            module,
            node,
            level,
            duration_ms,
            exception,
            exception_type,
            extra,
        }
    }

    /// Resolve the trace id through its fallback chain
    ///
    /// The first usable candidate wins and is trimmed. A candidate that trims
    /// to nothing does NOT fall through; the event lands in the sentinel
    /// bucket instead.
    fn resolve_trace_id(&self, primary: Option<String>, extra: &Map<String, Value>) -> String {
        primary
            .or_else(|| string_field(extra, TRACE_ID_FIELD_NAMES))
            .map(|raw| raw.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.missing_trace_id().to_string())
    }
}

/// Join module and function into a node id
fn join_node(module: &str, function_name: &str) -> String {
    if module.is_empty() {
        function_name.to_string()
    } else {
        format!("{}.{}", module, function_name)
    }
}

/// Resolve a string field through its candidate names
///
/// **Private** - first usable candidate wins; empty strings, zero, `false`,
/// and `null` count as absent so the next name gets a chance
fn string_field(fields: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| fields.get(*name).and_then(coerce_string))
}

/// Coerce a scalar JSON value into a usable string
///
/// **Private** - internal utility
fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => {
            // Zero reads as "field not set", like an empty string
            if number.as_f64() == Some(0.0) {
                None
            } else {
                Some(number.to_string())
            }
        }
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Resolve the duration field by key presence, not value truthiness
///
/// **Private** - a present `duration_ms` of 0 must NOT fall through to `ms`
fn duration_field(fields: &Map<String, Value>) -> f64 {
    for name in DURATION_FIELD_NAMES {
        if let Some(value) = fields.get(*name) {
            return safe_float(value);
        }
    }
    0.0
}

/// Coerce any JSON value to a float, defaulting to 0.0
///
/// **Public** - tolerant numeric coercion used for durations
pub fn safe_float(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => text.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(flag) => {
            if *flag {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Derive a sortable seconds-since-epoch key from timestamp text
///
/// **Public** - offset-aware text parses as RFC 3339; naive text is read as
/// UTC so ordering never depends on the host timezone; anything unparsable
/// keys at 0.0 and sorts ahead of all parsable timestamps
pub fn timestamp_sort_key(timestamp: &str) -> f64 {
    if timestamp.is_empty() {
        return 0.0;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return epoch_seconds(parsed.timestamp(), parsed.timestamp_subsec_nanos());
    }

    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp, format) {
            let utc = naive.and_utc();
            return epoch_seconds(utc.timestamp(), utc.timestamp_subsec_nanos());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(timestamp, DATE_ONLY_FORMAT) {
        return date.and_time(NaiveTime::MIN).and_utc().timestamp() as f64;
    }

    0.0
}

fn epoch_seconds(seconds: i64, subsec_nanos: u32) -> f64 {
    seconds as f64 + f64::from(subsec_nanos) / 1e9
}
