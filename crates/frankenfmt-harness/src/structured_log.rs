//! Structured logging contract for verification runs.
//!
//! Every verification run can leave a JSONL trail: one [`LogEntry`] per line,
//! written by a [`LogEmitter`] and checked by [`validate_log_line`] or
//! [`validate_log_file`].
//!
//! The schema itself is documented in `tests/conformance/log_schema.json`.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// Severity level for log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Test/verification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
    Error,
}

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const OUTCOMES: [&str; 4] = ["pass", "fail", "skip", "error"];
const MODES: [&str; 2] = ["strict", "legacy"];

/// Canonical structured log entry.
///
/// Required fields: `timestamp`, `trace_id`, `level`, `event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    // Required
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    // Optional
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture_set: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case: Option<String>,
    /// Format string under test.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errno: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    /// Create a new log entry with required fields only.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            run_id: None,
            mode: None,
            fixture_set: None,
            case: None,
            format: None,
            outcome: None,
            errno: None,
            latency_ns: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_run(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Set the formatting mode.
    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Set the fixture set and case name.
    #[must_use]
    pub fn with_case(mut self, fixture_set: impl Into<String>, case: impl Into<String>) -> Self {
        self.fixture_set = Some(fixture_set.into());
        self.case = Some(case.into());
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn with_errno(mut self, errno: i32) -> Self {
        self.errno = Some(errno);
        self
    }

    /// Set latency in nanoseconds.
    #[must_use]
    pub fn with_latency_ns(mut self, ns: u64) -> Self {
        self.latency_ns = Some(ns);
        self
    }

    /// Set free-form details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Serialize to a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Log emitter
// ---------------------------------------------------------------------------

/// Writes structured JSONL log entries.
///
/// Trace ids follow `<run_id>::<scope>::<seq>`; the scope is usually the
/// fixture family being verified.
pub struct LogEmitter {
    writer: Box<dyn Write>,
    seq: u64,
    run_id: String,
    scope: String,
}

impl LogEmitter {
    /// Create an emitter that writes to a file.
    pub fn to_file(path: &Path, run_id: &str) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::with_writer(
            Box::new(std::io::BufWriter::new(file)),
            run_id,
        ))
    }

    /// Create an emitter that writes to a `Vec<u8>` buffer (for testing).
    #[must_use]
    pub fn to_buffer(run_id: &str) -> Self {
        Self::with_writer(Box::new(Vec::new()), run_id)
    }

    fn with_writer(writer: Box<dyn Write>, run_id: &str) -> Self {
        Self {
            writer,
            seq: 0,
            run_id: run_id.to_string(),
            scope: String::from("run"),
        }
    }

    /// Change the scope segment of subsequent trace ids.
    pub fn set_scope(&mut self, scope: &str) {
        self.scope = scope.replace("::", "/");
    }

    fn next_trace_id(&mut self) -> String {
        self.seq += 1;
        format!("{}::{}::{:03}", self.run_id, self.scope, self.seq)
    }

    /// Emit a log entry with auto-generated trace_id and run_id.
    pub fn emit(&mut self, level: LogLevel, event: &str) -> std::io::Result<LogEntry> {
        let trace_id = self.next_trace_id();
        let entry = LogEntry::new(trace_id, level, event).with_run(&self.run_id);
        self.write_line(&entry)?;
        Ok(entry)
    }

    /// Emit a fully-populated log entry.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> std::io::Result<()> {
        if entry.trace_id.is_empty() {
            entry.trace_id = self.next_trace_id();
        }
        if entry.run_id.is_none() {
            entry.run_id = Some(self.run_id.clone());
        }
        self.write_line(&entry)
    }

    fn write_line(&mut self, entry: &LogEntry) -> std::io::Result<()> {
        let line = entry.to_jsonl().map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// One problem found in one log line.
#[derive(Debug, thiserror::Error)]
#[error("line {line_number}: field '{field}': {message}")]
pub struct LogValidationError {
    pub line_number: usize,
    pub field: String,
    pub message: String,
}

/// Collects the problems of a single line.
struct LineCheck {
    line_number: usize,
    problems: Vec<LogValidationError>,
}

impl LineCheck {
    fn flag(&mut self, field: &str, message: impl Into<String>) {
        self.problems.push(LogValidationError {
            line_number: self.line_number,
            field: field.to_owned(),
            message: message.into(),
        });
    }

    fn one_of(
        &mut self,
        obj: &serde_json::Map<String, serde_json::Value>,
        field: &str,
        allowed: &[&str],
    ) {
        match obj.get(field).map(serde_json::Value::as_str) {
            None => {}
            Some(Some(v)) if allowed.contains(&v) => {}
            Some(Some(v)) => self.flag(field, format!("'{v}' is not one of {allowed:?}")),
            Some(None) => self.flag(field, "must be a string"),
        }
    }
}

/// Check one JSONL line: JSON object shape, required keys, enum values,
/// trace id layout, and that every outcome names its case.
pub fn validate_log_line(
    line: &str,
    line_number: usize,
) -> Result<LogEntry, Vec<LogValidationError>> {
    let mut check = LineCheck {
        line_number,
        problems: Vec::new(),
    };

    let value = match serde_json::from_str::<serde_json::Value>(line) {
        Ok(serde_json::Value::Object(obj)) => obj,
        Ok(_) => {
            check.flag("<root>", "not a JSON object");
            return Err(check.problems);
        }
        Err(e) => {
            check.flag("<json>", format!("unparseable: {e}"));
            return Err(check.problems);
        }
    };

    for key in ["timestamp", "trace_id", "level", "event"] {
        if !value.contains_key(key) {
            check.flag(key, "missing");
        }
    }
    check.one_of(&value, "level", &LEVELS);
    check.one_of(&value, "mode", &MODES);
    check.one_of(&value, "outcome", &OUTCOMES);

    if let Some(id) = value.get("trace_id").and_then(serde_json::Value::as_str) {
        let parts: Vec<&str> = id.split("::").collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            check.flag("trace_id", format!("'{id}' is not <run_id>::<scope>::<seq>"));
        }
    }
    let has_case = value.get("case").is_some_and(serde_json::Value::is_string);
    if value.contains_key("outcome") && !has_case {
        check.flag("case", "an outcome needs a case name");
    }

    if !check.problems.is_empty() {
        return Err(check.problems);
    }
    serde_json::from_value(serde_json::Value::Object(value)).map_err(|e| {
        check.flag("<entry>", e.to_string());
        check.problems
    })
}

/// Validate every non-blank line of a JSONL file.
///
/// Returns the number of lines checked and all problems found, numbered by
/// their position in the file.
pub fn validate_log_file(path: &Path) -> std::io::Result<(usize, Vec<LogValidationError>)> {
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();
    let problems = lines
        .iter()
        .filter_map(|&(n, line)| validate_log_line(line, n).err())
        .flatten()
        .collect();
    Ok((lines.len(), problems))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Current time as an RFC 3339 UTC timestamp with millisecond precision.
pub fn now_utc() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format_utc(duration.as_secs(), duration.subsec_millis())
}

/// RFC 3339 rendering of a Unix timestamp (proleptic Gregorian, UTC).
fn format_utc(secs: u64, millis: u32) -> String {
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;

    // Civil-from-days over 400-year eras.
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{millis:03}Z",
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_entry_serializes_required_fields() {
        let entry = LogEntry::new("run-1::printf/integer::001", LogLevel::Info, "verify_start");
        let json = entry.to_jsonl().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["timestamp"].is_string());
        assert_eq!(parsed["trace_id"], "run-1::printf/integer::001");
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["event"], "verify_start");
        assert!(parsed.get("run_id").is_none());
        assert!(parsed.get("mode").is_none());
    }

    #[test]
    fn log_entry_with_all_optional_fields() {
        let entry = LogEntry::new("run-1::printf/float::002", LogLevel::Error, "case_result")
            .with_run("run-1")
            .with_mode("strict")
            .with_case("printf/float", "exp_tie")
            .with_format("%.2e")
            .with_outcome(Outcome::Fail)
            .with_errno(75)
            .with_latency_ns(150)
            .with_details(serde_json::json!({"expected": "1.50e+06"}));

        let json = entry.to_jsonl().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["run_id"], "run-1");
        assert_eq!(parsed["mode"], "strict");
        assert_eq!(parsed["fixture_set"], "printf/float");
        assert_eq!(parsed["case"], "exp_tie");
        assert_eq!(parsed["format"], "%.2e");
        assert_eq!(parsed["outcome"], "fail");
        assert_eq!(parsed["errno"], 75);
        assert_eq!(parsed["latency_ns"], 150);
        assert!(parsed["details"].is_object());
        assert!(validate_log_line(&json, 1).is_ok());
    }

    #[test]
    fn validate_missing_required_field() {
        let json = r#"{"timestamp":"2026-01-01T00:00:00Z","level":"info","event":"test"}"#;
        let errors = validate_log_line(json, 1).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "trace_id"));
    }

    #[test]
    fn validate_invalid_enums() {
        let json = r#"{"timestamp":"t","trace_id":"a::b::c","level":"critical","event":"e","mode":"hardened"}"#;
        let errors = validate_log_line(json, 4).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "level"));
        assert!(errors.iter().any(|e| e.field == "mode"));
        assert!(errors.iter().all(|e| e.line_number == 4));
    }

    #[test]
    fn validate_outcome_requires_case() {
        let json = r#"{"timestamp":"t","trace_id":"a::b::c","level":"info","event":"e","outcome":"pass"}"#;
        let errors = validate_log_line(json, 1).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "case"));
    }

    #[test]
    fn validate_invalid_json() {
        let errors = validate_log_line("not json at all", 1).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "<json>"));
    }

    #[test]
    fn validate_bad_trace_id_format() {
        let json = r#"{"timestamp":"t","trace_id":"no-separator","level":"info","event":"e"}"#;
        let errors = validate_log_line(json, 1).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "trace_id"));
    }

    #[test]
    fn emitter_generates_sequential_trace_ids() {
        let mut emitter = LogEmitter::to_buffer("run-42");
        let e1 = emitter.emit(LogLevel::Info, "verify_start").unwrap();
        emitter.set_scope("printf::integer");
        let e2 = emitter.emit(LogLevel::Info, "case_result").unwrap();
        assert_eq!(e1.trace_id, "run-42::run::001");
        assert_eq!(e2.trace_id, "run-42::printf/integer::002");
        assert_eq!(e2.run_id.as_deref(), Some("run-42"));
    }

    #[test]
    fn utc_formatting() {
        assert_eq!(format_utc(0, 0), "1970-01-01T00:00:00.000Z");
        assert_eq!(format_utc(951_782_400, 5), "2000-02-29T00:00:00.005Z");
        assert_eq!(format_utc(1_790_000_000, 250), "2026-09-21T14:13:20.250Z");
    }
}
