//! Conformance testing harness for frankenfmt.
//!
//! This crate provides:
//! - Fixtures: JSON case files pairing a format string and arguments with the
//!   expected bytes and return value
//! - Runner: executes fixture cases through the engine, including a truncated
//!   re-run of every case
//! - Verification summaries, text diffs and markdown/JSON reports
//! - Structured JSONL logging for verification runs

#![forbid(unsafe_code)]

pub mod diff;
pub mod fixtures;
pub mod report;
pub mod runner;
pub mod structured_log;
pub mod verify;

pub use fixtures::{FixtureArg, FixtureCase, FixtureError, FixtureSet};
pub use report::ConformanceReport;
pub use runner::TestRunner;
pub use verify::{VerificationResult, VerificationSummary};
