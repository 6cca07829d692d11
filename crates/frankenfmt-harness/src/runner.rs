//! Test execution engine.

use std::time::Instant;

use frankenfmt_core::stdio::{Arg, format_to_mode};
use frankenfmt_core::{FormatError, Mode};

use crate::diff;
use crate::fixtures::{FixtureCase, FixtureError, FixtureSet, with_lowered};
use crate::verify::VerificationResult;

/// Runs a fixture set and collects verification results.
pub struct TestRunner {
    /// Name of the test campaign.
    pub campaign: String,
    /// Mode being tested.
    pub mode: Mode,
}

/// Everything observed from one formatting call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Bytes stored before the terminator.
    pub stored: Vec<u8>,
    /// Engine result.
    pub result: Result<usize, FormatError>,
    /// True if the byte after `stored` is the terminator.
    pub terminated: bool,
}

impl Rendered {
    /// What the C-shaped wrapper would return.
    #[must_use]
    pub fn wrapper_return(&self) -> i64 {
        match self.result {
            Ok(len) => len as i64,
            Err(_) => -1,
        }
    }
}

/// Format `format` with `args` into a fresh buffer of `capacity` bytes.
#[must_use]
pub fn render(mode: Mode, format: &[u8], args: &[Arg<'_>], capacity: usize) -> Rendered {
    let mut buf = vec![0xA5u8; capacity];
    let result = format_to_mode(mode, &mut buf, format, args);
    let stored_len = match result {
        Ok(len) => len.min(capacity.saturating_sub(1)),
        // On error the logical length is gone; the terminator marks the end.
        Err(_) => buf.iter().position(|&b| b == 0).unwrap_or(0),
    };
    let terminated = capacity == 0 || buf.get(stored_len) == Some(&0);
    buf.truncate(stored_len);
    Rendered {
        stored: buf,
        result,
        terminated,
    }
}

impl TestRunner {
    /// Create a new test runner.
    #[must_use]
    pub fn new(campaign: impl Into<String>, mode: Mode) -> Self {
        Self {
            campaign: campaign.into(),
            mode,
        }
    }

    /// Run all fixtures in a set that apply to this runner's mode.
    pub fn run(&self, fixture_set: &FixtureSet) -> Vec<VerificationResult> {
        fixture_set
            .cases
            .iter()
            .filter(|case| case.applies_to(self.mode).unwrap_or(true))
            .map(|case| self.run_case(case))
            .collect()
    }

    /// Execute one case and compare against its expectations.
    #[must_use]
    pub fn run_case(&self, case: &FixtureCase) -> VerificationResult {
        let mut result = VerificationResult {
            case_name: case.name.clone(),
            section: case.section.clone(),
            mode: self.mode.as_str().to_string(),
            passed: false,
            expected: case.expected_output.clone(),
            actual: String::new(),
            expected_return: case.expected_return,
            actual_return: -1,
            errno: None,
            latency_ns: 0,
            diff: None,
        };

        if let Err(err) = case.applies_to(self.mode) {
            result.actual = format!("fixture-error:{err}");
            result.diff = Some(err.to_string());
            return result;
        }

        match self.execute(case) {
            Ok(execution) => {
                let rendered = &execution.full;
                result.actual = String::from_utf8_lossy(&rendered.stored).into_owned();
                result.actual_return = rendered.wrapper_return();
                result.errno = rendered.result.err().map(FormatError::errno);
                result.latency_ns = execution.latency_ns;

                let mut notes = Vec::new();
                if result.actual != case.expected_output {
                    notes.push(diff::render_diff(&case.expected_output, &result.actual));
                }
                if result.actual_return != case.expected_return {
                    notes.push(format!(
                        "return mismatch: expected={}, actual={}",
                        case.expected_return, result.actual_return
                    ));
                }
                if !rendered.terminated {
                    notes.push(String::from("buffer not terminated"));
                }
                if let Some(note) = execution.truncation_note {
                    notes.push(note);
                }
                result.passed = notes.is_empty();
                if !notes.is_empty() {
                    result.diff = Some(notes.join("\n"));
                }
            }
            Err(err) => {
                result.actual = format!("fixture-error:{err}");
                result.diff = Some(diff::render_diff(&case.expected_output, &result.actual));
            }
        }
        result
    }

    fn execute(&self, case: &FixtureCase) -> Result<Execution, FixtureError> {
        let format = case.format.as_bytes();
        with_lowered(&case.args, |args| {
            let start = Instant::now();
            let full = render(self.mode, format, args, case.capacity);
            let latency_ns = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);

            let truncation_note = match full.result {
                Ok(len) => {
                    let short_cap = case.expected_output.len() / 2 + 1;
                    let short = render(self.mode, format, args, short_cap);
                    check_truncation(&full.stored, len, &short, short_cap)
                }
                Err(_) => None,
            };
            Execution {
                full,
                latency_ns,
                truncation_note,
            }
        })
    }
}

struct Execution {
    full: Rendered,
    latency_ns: u64,
    truncation_note: Option<String>,
}

/// Check the truncated re-run against the full one: same length, stored
/// bytes a prefix of the full output, terminated.
fn check_truncation(full: &[u8], len: usize, short: &Rendered, cap: usize) -> Option<String> {
    if short.result != Ok(len) {
        return Some(format!(
            "truncated run at capacity {cap} returned {:?}, full run returned {len}",
            short.result
        ));
    }
    let keep = len.min(cap.saturating_sub(1)).min(full.len());
    if short.stored != full[..keep] {
        return Some(format!(
            "truncated run at capacity {cap} is not a prefix: {}",
            diff::render_diff(
                &String::from_utf8_lossy(&full[..keep]),
                &String::from_utf8_lossy(&short.stored)
            )
        ));
    }
    if !short.terminated {
        return Some(format!("truncated run at capacity {cap} not terminated"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(cases: &str) -> FixtureSet {
        FixtureSet::from_json(&format!(
            r#"{{"version":"v1","family":"printf/smoke","captured_at":"2026-10-01T00:00:00Z","cases":[{cases}]}}"#
        ))
        .expect("valid fixture json")
    }

    #[test]
    fn strict_runner_executes_matching_cases() {
        let set = fixture(
            r#"{"name":"pad","format":"%05d","args":[{"int":42}],"expected_output":"00042","expected_return":5},
               {"name":"echo","format":"a%kb","expected_output":"akb","expected_return":3,"mode":"legacy"}"#,
        );
        let strict = TestRunner::new("smoke", Mode::Strict).run(&set);
        assert_eq!(strict.len(), 1);
        assert!(strict[0].passed, "{:?}", strict[0].diff);
        assert_eq!(strict[0].mode, "strict");
    }

    #[test]
    fn legacy_runner_echoes_unknown_conversions() {
        let set = fixture(
            r#"{"name":"echo","format":"a%kb","expected_output":"akb","expected_return":3,"mode":"legacy"},
               {"name":"reject","format":"a%kb","expected_output":"a%k<invalid>","expected_return":-1,"mode":"strict"}"#,
        );
        let legacy = TestRunner::new("smoke", Mode::Legacy).run(&set);
        assert_eq!(legacy.len(), 1);
        assert!(legacy[0].passed, "{:?}", legacy[0].diff);

        let strict = TestRunner::new("smoke", Mode::Strict).run(&set);
        assert_eq!(strict.len(), 1);
        assert!(strict[0].passed, "{:?}", strict[0].diff);
        assert_eq!(strict[0].errno, Some(frankenfmt_core::error::EINVAL));
    }

    #[test]
    fn small_capacity_case() {
        let set = fixture(
            r#"{"name":"trunc","format":"0%s","args":[{"str":"1234567"}],"capacity":6,"expected_output":"01234","expected_return":8}"#,
        );
        let results = TestRunner::new("trunc", Mode::Strict).run(&set);
        assert!(results[0].passed, "{:?}", results[0].diff);
    }

    #[test]
    fn mismatch_produces_diff() {
        let set = fixture(
            r#"{"name":"wrong","format":"%d","args":[{"int":1}],"expected_output":"2","expected_return":1}"#,
        );
        let results = TestRunner::new("bad", Mode::Strict).run(&set);
        assert!(!results[0].passed);
        let diff = results[0].diff.as_deref().unwrap_or_default();
        assert!(diff.contains("-2"));
        assert!(diff.contains("+1"));
    }

    #[test]
    fn render_reports_termination() {
        let out = render(Mode::Strict, b"%s", &[Arg::from("hello")], 3);
        assert_eq!(out.stored, b"he");
        assert_eq!(out.result, Ok(5));
        assert!(out.terminated);
        let empty = render(Mode::Strict, b"%s", &[Arg::from("hello")], 0);
        assert!(empty.stored.is_empty());
        assert_eq!(empty.wrapper_return(), 5);
    }

    #[test]
    fn truncation_check_flags_wrong_prefix() {
        let short = Rendered {
            stored: b"xy".to_vec(),
            result: Ok(4),
            terminated: true,
        };
        assert!(check_truncation(b"abcd", 4, &short, 3).is_some());
        let good = Rendered {
            stored: b"ab".to_vec(),
            result: Ok(4),
            terminated: true,
        };
        assert!(check_truncation(b"abcd", 4, &good, 3).is_none());
    }
}
