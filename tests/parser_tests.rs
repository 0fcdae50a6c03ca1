use nfo_flow::{LogFlowParser, LogSource, ParseError};
use std::io::Write;
use tempfile::NamedTempFile;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const SAMPLE_LOG: &str = r#"{"ts": "2026-03-01T09:00:00Z", "fn": "receive", "mod": "gateway", "tid": "req-1", "ms": 1.25}

{"ts": "2026-03-01T09:00:01Z", "fn": "charge", "mod": "billing", "tid": "req-1", "ms": 2.5, "err": "card declined", "et": "CardError"}
{"ts": "2026-03-01T09:00:02Z", "fn": "respond", "mod": "gateway", "tid": "req-1", "ms": 0.75}
"#;

#[test]
fn test_parse_jsonl_from_text() {
    init_logs();
    let parser = LogFlowParser::new();

    let events = parser.parse_jsonl(SAMPLE_LOG, true).unwrap();

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].node, "gateway.receive");
    assert_eq!(events[0].level, "INFO");
    assert_eq!(events[1].trace_id, "req-1");
    assert_eq!(events[1].exception, "card declined");
    assert!(events[1].has_error());
    assert_eq!(events[2].duration_ms, 0.75);
}

#[test]
fn test_lenient_mode_skips_malformed_lines() {
    init_logs();
    let parser = LogFlowParser::new();
    let text = "{\"fn\": \"good\"}\nnot json at all\n[1, 2, 3]\n{\"fn\": \"also_good\"}";

    let events = parser.parse_jsonl(text, false).unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].function_name, "good");
    assert_eq!(events[1].function_name, "also_good");
}

#[test]
fn test_strict_mode_reports_line_number() {
    let parser = LogFlowParser::new();
    let text = "{\"fn\": \"a\"}\n{\"fn\": \"b\"}\n{broken\n{\"fn\": \"c\"}";

    let err = parser.parse_jsonl(text, true).unwrap_err();

    assert!(matches!(err, ParseError::InvalidJson { line: 3, .. }));
    assert!(err.to_string().starts_with("Invalid JSON on line 3:"));
}

#[test]
fn test_strict_mode_rejects_non_object_lines() {
    let parser = LogFlowParser::new();
    let text = "{\"fn\": \"a\"}\n\"just a string\"";

    let err = parser.parse_jsonl(text, true).unwrap_err();

    assert!(matches!(err, ParseError::NotAnObject { line: 2 }));
    assert_eq!(err.to_string(), "JSON line 2 is not an object");
}

#[test]
fn test_blank_lines_do_not_shift_line_numbers() {
    let parser = LogFlowParser::new();
    let text = "\n\n{\"fn\": \"a\"}\n\nbroken";

    let err = parser.parse_jsonl(text, true).unwrap_err();
    assert!(matches!(err, ParseError::InvalidJson { line: 5, .. }));
}

#[test]
fn test_parse_jsonl_from_file() -> anyhow::Result<()> {
    init_logs();
    let mut file = NamedTempFile::new()?;
    write!(file, "{}", SAMPLE_LOG)?;

    let parser = LogFlowParser::new();
    let events = parser.parse_jsonl(file.path(), true)?;

    assert_eq!(events.len(), 3);
    assert_eq!(events[1].node, "billing.charge");
    Ok(())
}

#[test]
fn test_path_string_without_newline_reads_file() -> anyhow::Result<()> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{}", SAMPLE_LOG)?;

    let parser = LogFlowParser::new();
    let path_string = file.path().to_str().unwrap().to_string();
    let events = parser.parse_jsonl(path_string, true)?;

    assert_eq!(events.len(), 3);
    Ok(())
}

#[test]
fn test_text_with_newline_is_never_a_path() {
    let parser = LogFlowParser::new();
    // Two lines, so this is literal text even if a file by this name existed
    let events = parser.parse_jsonl("{\"fn\": \"a\"}\n{\"fn\": \"b\"}", true).unwrap();
    assert_eq!(events.len(), 2);
}

#[test]
fn test_missing_file_is_io_error() {
    let parser = LogFlowParser::new();
    let missing = std::path::PathBuf::from("/definitely/not/here.jsonl");

    let err = parser.parse_jsonl(missing, true).unwrap_err();
    assert!(matches!(err, ParseError::Io(_)));
}

#[test]
fn test_lines_source() {
    let parser = LogFlowParser::new();
    let lines = vec![
        "{\"fn\": \"a\", \"tid\": \"t\"}".to_string(),
        "{\"fn\": \"b\", \"tid\": \"t\"}".to_string(),
    ];

    let events = parser.parse_jsonl(LogSource::Lines(lines), true).unwrap();
    assert_eq!(events.len(), 2);
}

#[test]
fn test_defaults_applied_during_parse() {
    let parser = LogFlowParser::new();
    let events = parser.parse_jsonl("{}", true).unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].function_name, "?");
    assert_eq!(events[0].level, "INFO");
    assert_eq!(events[0].trace_id, "no-trace");
    assert_eq!(events[0].node, "?");
    assert_eq!(events[0].duration_ms, 0.0);
}

#[test]
fn test_custom_missing_trace_sentinel() {
    let parser = LogFlowParser::with_missing_trace_id("orphan");
    let events = parser.parse_jsonl("{\"fn\": \"a\"}", true).unwrap();

    assert_eq!(parser.missing_trace_id(), "orphan");
    assert_eq!(events[0].trace_id, "orphan");
}

#[test]
fn test_parse_to_graph_end_to_end() {
    init_logs();
    let parser = LogFlowParser::new();

    let graph = parser.parse_to_graph(SAMPLE_LOG, true).unwrap();

    assert_eq!(graph.stats.trace_count, 1);
    assert_eq!(graph.stats.event_count, 3);
    assert_eq!(graph.stats.error_count, 1);
    assert_eq!(graph.traces[0].trace_id, "req-1");
}
