//! CLI entrypoint for the frankenfmt conformance harness.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use frankenfmt_core::Mode;
use frankenfmt_harness::fixtures::{DEFAULT_CAPACITY, FixtureArg, with_lowered};
use frankenfmt_harness::runner::render;
use frankenfmt_harness::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome, now_utc};
use frankenfmt_harness::{ConformanceReport, FixtureSet, TestRunner, VerificationSummary};

/// Conformance tooling for frankenfmt.
#[derive(Debug, Parser)]
#[command(name = "frankenfmt-harness")]
#[command(about = "Conformance testing harness for frankenfmt")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Verify the engine against fixture files.
    Verify {
        /// Directory containing fixture JSON files.
        #[arg(long)]
        fixture: PathBuf,
        /// Output report path (markdown; a `.json` twin is written alongside).
        #[arg(long)]
        report: Option<PathBuf>,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Mode to verify (`strict`, `legacy` or `both`). Defaults to FRANKENFMT_MODE.
        #[arg(long)]
        mode: Option<String>,
    },
    /// Format one string and print the stored bytes and return value.
    Render {
        /// Format string.
        #[arg(long)]
        format: String,
        /// Arguments as a fixture JSON array, e.g. `[{"int":42},{"str":"x"}]`.
        #[arg(long, default_value = "[]")]
        args: String,
        /// Destination buffer size, terminator included.
        #[arg(long, default_value_t = DEFAULT_CAPACITY)]
        capacity: usize,
        /// Mode (`strict` or `legacy`). Defaults to FRANKENFMT_MODE.
        #[arg(long)]
        mode: Option<String>,
    },
    /// Validate a structured JSONL log file.
    ValidateLog {
        /// Log file path.
        #[arg(long)]
        log: PathBuf,
    },
}

fn parse_modes(mode: Option<&str>) -> Result<Vec<Mode>, String> {
    match mode.map(str::to_ascii_lowercase).as_deref() {
        None => Ok(vec![frankenfmt_core::config::mode()]),
        Some("strict") => Ok(vec![Mode::Strict]),
        Some("legacy") => Ok(vec![Mode::Legacy]),
        Some("both") => Ok(vec![Mode::Strict, Mode::Legacy]),
        Some(other) => Err(format!(
            "Unsupported mode '{other}', expected strict|legacy|both"
        )),
    }
}

fn run_id() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("verify-{secs}")
}

fn verify(
    fixture: PathBuf,
    report: Option<PathBuf>,
    log: Option<PathBuf>,
    modes: &[Mode],
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Verifying against fixtures in {}", fixture.display());
    let (fixture_sets, load_errors) = FixtureSet::load_dir(&fixture)?;
    for err in &load_errors {
        eprintln!("Skipping fixture: {err}");
    }
    if fixture_sets.is_empty() {
        return Err(format!("No fixture JSON files found in {}", fixture.display()).into());
    }

    let run_id = run_id();
    let mut emitter = match &log {
        Some(path) => Some(LogEmitter::to_file(path, &run_id)?),
        None => None,
    };
    let mode_label = modes
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("+");

    if let Some(emitter) = emitter.as_mut() {
        let entry = LogEntry::new("", LogLevel::Info, "verify_start").with_details(
            serde_json::json!({"fixture_dir": fixture.display().to_string(), "modes": mode_label.as_str()}),
        );
        emitter.emit_entry(entry)?;
    }

    let mut results = Vec::new();
    for &mode in modes {
        let runner = TestRunner::new("fixture-verify", mode);
        for set in &fixture_sets {
            let set_results = runner.run(set);
            if let Some(emitter) = emitter.as_mut() {
                emitter.set_scope(&set.family);
                for (case, result) in set
                    .cases
                    .iter()
                    .filter(|case| case.applies_to(mode).unwrap_or(true))
                    .zip(&set_results)
                {
                    let (level, outcome) = if result.passed {
                        (LogLevel::Info, Outcome::Pass)
                    } else {
                        (LogLevel::Error, Outcome::Fail)
                    };
                    let mut entry = LogEntry::new("", level, "case_result")
                        .with_mode(mode.as_str())
                        .with_case(&set.family, &result.case_name)
                        .with_format(&case.format)
                        .with_outcome(outcome)
                        .with_latency_ns(result.latency_ns);
                    if let Some(errno) = result.errno {
                        entry = entry.with_errno(errno);
                    }
                    if let Some(diff) = &result.diff {
                        entry = entry.with_details(serde_json::json!({ "diff": diff }));
                    }
                    emitter.emit_entry(entry)?;
                }
            }
            results.extend(set_results);
        }
    }

    let summary = VerificationSummary::from_results(results);
    let report_doc = ConformanceReport {
        title: String::from("frankenfmt Conformance Report"),
        mode: mode_label,
        timestamp: now_utc(),
        summary,
    };

    eprintln!(
        "Verification complete: total={}, passed={}, failed={}",
        report_doc.summary.total, report_doc.summary.passed, report_doc.summary.failed
    );
    for failure in report_doc.summary.failures() {
        eprintln!("FAIL {} [{}]", failure.case_name, failure.mode);
        if let Some(diff) = &failure.diff {
            eprintln!("{diff}");
        }
    }

    if let Some(emitter) = emitter.as_mut() {
        emitter.set_scope("run");
        let entry = LogEntry::new("", LogLevel::Info, "verify_complete").with_details(
            serde_json::json!({
                "total": report_doc.summary.total,
                "passed": report_doc.summary.passed,
                "failed": report_doc.summary.failed,
            }),
        );
        emitter.emit_entry(entry)?;
        emitter.flush()?;
    }

    if let Some(report_path) = report {
        eprintln!("Writing report to {}", report_path.display());
        std::fs::write(&report_path, report_doc.to_markdown())?;
        let json_path = report_path.with_extension("json");
        std::fs::write(&json_path, report_doc.to_json())?;
    }

    if !report_doc.summary.all_passed() {
        return Err("Conformance verification failed".into());
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Verify {
            fixture,
            report,
            log,
            mode,
        } => {
            let modes = parse_modes(mode.as_deref())?;
            verify(fixture, report, log, &modes)?;
        }
        Command::Render {
            format,
            args,
            capacity,
            mode,
        } => {
            let modes = parse_modes(mode.as_deref())?;
            let &[mode] = modes.as_slice() else {
                return Err("render takes a single mode".into());
            };
            let args: Vec<FixtureArg> = serde_json::from_str(&args)?;
            let rendered = with_lowered(&args, |lowered| {
                render(mode, format.as_bytes(), lowered, capacity)
            })?;
            println!("{}", String::from_utf8_lossy(&rendered.stored).escape_debug());
            match rendered.result {
                Ok(len) => eprintln!("return={len}"),
                Err(err) => eprintln!("return=-1 errno={} ({err})", err.errno()),
            }
        }
        Command::ValidateLog { log } => {
            let (lines, errors) =
                frankenfmt_harness::structured_log::validate_log_file(&log)?;
            for err in &errors {
                eprintln!("{err}");
            }
            eprintln!(
                "Validated {} ({lines} lines, {} errors)",
                log.display(),
                errors.len()
            );
            if !errors.is_empty() {
                return Err("Structured log validation failed".into());
            }
        }
    }

    Ok(())
}
