//! Error types for the entire crate.
//!
//! We use `thiserror` for library-style errors with custom types.
//! Normalization and graph building are total functions and never fail;
//! everything fallible lives at the ingestion and value-admission boundary.

use thiserror::Error;

/// Errors that can occur while ingesting or admitting log records
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid JSON on line {line}: {reason}")]
    InvalidJson { line: usize, reason: String },

    #[error("JSON line {line} is not an object")]
    NotAnObject { line: usize },

    #[error("Unsupported record type: {0}")]
    UnsupportedRecord(&'static str),

    #[error("Invalid flow graph value: {0}")]
    InvalidGraph(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
