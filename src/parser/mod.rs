//! Record parsing and normalization.
//!
//! This module handles:
//! - The record shapes admitted into the pipeline
//! - Normalization into the canonical event schema
//! - JSON Lines ingestion from text, files, or pre-split lines

pub mod jsonl;
pub mod normalize;
pub mod record;

// Re-export main types
pub use jsonl::LogSource;
pub use normalize::{safe_float, timestamp_sort_key, NormalizedEvent};
pub use record::{LogRecord, RecordValue};
