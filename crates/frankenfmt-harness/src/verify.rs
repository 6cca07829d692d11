//! Output comparison and verification.

use serde::{Deserialize, Serialize};

/// Result of verifying a single fixture case in one mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Name of the test case.
    pub case_name: String,
    /// C standard or extension section reference.
    pub section: String,
    /// Mode the case ran in.
    pub mode: String,
    /// Whether the case passed.
    pub passed: bool,
    /// Expected stored bytes.
    pub expected: String,
    /// Stored bytes produced by the engine.
    pub actual: String,
    /// Expected wrapper return value.
    pub expected_return: i64,
    /// Wrapper return value produced by the engine.
    pub actual_return: i64,
    /// errno a libc wrapper would set, when the call failed.
    pub errno: Option<i32>,
    /// Wall-clock time spent formatting, in nanoseconds.
    pub latency_ns: u64,
    /// Diff or contract notes if the case failed.
    pub diff: Option<String>,
}

/// Aggregate verification summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    /// Total cases run.
    pub total: usize,
    /// Cases passed.
    pub passed: usize,
    /// Cases failed.
    pub failed: usize,
    /// Individual results.
    pub results: Vec<VerificationResult>,
}

impl VerificationSummary {
    /// Build a summary from a list of results.
    #[must_use]
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let failed = total - passed;
        Self {
            total,
            passed,
            failed,
            results,
        }
    }

    /// Returns true if all cases passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// The failing results, in run order.
    pub fn failures(&self) -> impl Iterator<Item = &VerificationResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}
