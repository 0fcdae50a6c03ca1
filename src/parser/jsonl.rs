//! JSON Lines ingestion.
//!
//! Sources arrive as raw text, a file path, or pre-split lines. Parsing is
//! line-oriented: one JSON object per line, blank lines skipped, line
//! numbers counted from 1 for error reporting.

use crate::aggregator::FlowGraph;
use crate::parser::NormalizedEvent;
use crate::utils::error::ParseError;
use crate::LogFlowParser;
use log::{debug, warn};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Where JSON Lines content comes from
#[derive(Debug, Clone)]
pub enum LogSource {
    /// Read the file at this path
    Path(PathBuf),
    /// Raw text; a single line naming an existing file is read as a file
    Text(String),
    /// Lines already split by the caller
    Lines(Vec<String>),
}

impl From<&str> for LogSource {
    fn from(text: &str) -> Self {
        LogSource::Text(text.to_string())
    }
}

impl From<String> for LogSource {
    fn from(text: String) -> Self {
        LogSource::Text(text)
    }
}

impl From<&Path> for LogSource {
    fn from(path: &Path) -> Self {
        LogSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for LogSource {
    fn from(path: PathBuf) -> Self {
        LogSource::Path(path)
    }
}

impl From<Vec<String>> for LogSource {
    fn from(lines: Vec<String>) -> Self {
        LogSource::Lines(lines)
    }
}

impl From<Vec<&str>> for LogSource {
    fn from(lines: Vec<&str>) -> Self {
        LogSource::Lines(lines.into_iter().map(str::to_string).collect())
    }
}

impl LogSource {
    /// Resolve the source into individual lines
    ///
    /// **Private** - text with no newline that names an existing file is
    /// treated as a path; everything else is literal content
    fn into_lines(self) -> Result<Vec<String>, ParseError> {
        match self {
            LogSource::Path(path) => read_file_lines(&path),
            LogSource::Text(text) => {
                if !text.contains('\n') && Path::new(&text).exists() {
                    read_file_lines(Path::new(&text))
                } else {
                    Ok(text.lines().map(str::to_string).collect())
                }
            }
            LogSource::Lines(lines) => Ok(lines),
        }
    }
}

/// Read a file as lines; invalid UTF-8 is replaced rather than fatal
fn read_file_lines(path: &Path) -> Result<Vec<String>, ParseError> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.lines().map(str::to_string).collect())
}

impl LogFlowParser {
    /// Parse JSON Lines into normalized events
    ///
    /// **Public** - main entry point for ingestion
    ///
    /// # Arguments
    /// * `source` - File path, raw JSONL text, or pre-split lines
    /// * `strict` - Abort on the first malformed line instead of skipping it
    ///
    /// # Returns
    /// Normalized events in input line order
    ///
    /// # Errors
    /// * `ParseError::Io` - The source file could not be read
    /// * `ParseError::InvalidJson` - Strict mode hit a malformed line
    /// * `ParseError::NotAnObject` - Strict mode hit a non-object line
    pub fn parse_jsonl(
        &self,
        source: impl Into<LogSource>,
        strict: bool,
    ) -> Result<Vec<NormalizedEvent>, ParseError> {
        let lines = source.into().into_lines()?;
        let mut events = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let line_number = index + 1;
            let stripped = line.trim();
            if stripped.is_empty() {
                continue;
            }

            let payload: Value = match serde_json::from_str(stripped) {
                Ok(payload) => payload,
                Err(error) => {
                    if strict {
                        return Err(ParseError::InvalidJson {
                            line: line_number,
                            reason: error.to_string(),
                        });
                    }
                    warn!("Skipping invalid JSON on line {}: {}", line_number, error);
                    continue;
                }
            };

            match payload {
                Value::Object(fields) => events.push(self.normalize_fields(&fields)),
                _ => {
                    if strict {
                        return Err(ParseError::NotAnObject { line: line_number });
                    }
                    warn!("Skipping non-object JSON on line {}", line_number);
                }
            }
        }

        debug!("Parsed {} events from {} lines", events.len(), lines.len());
        Ok(events)
    }

    /// Ingest JSON Lines and build the flow graph in one step
    ///
    /// **Public** - convenience for callers that never touch raw events
    ///
    /// # Errors
    /// Same as [`LogFlowParser::parse_jsonl`]
    pub fn parse_to_graph(
        &self,
        source: impl Into<LogSource>,
        strict: bool,
    ) -> Result<FlowGraph, ParseError> {
        let events = self.parse_jsonl(source, strict)?;
        Ok(self.build_flow_graph(events))
    }
}
