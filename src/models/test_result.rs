//! Test result models
//!
//! Defines per-test results and the summary of a whole run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Test execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
}

impl TestStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Pass => "✓",
            TestStatus::Fail => "✗",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "PASS"),
            TestStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Result of a single test or subtest
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestResult {
    /// Full slash-separated name, e.g. `TestSum/zero`
    pub name: String,
    pub status: TestStatus,
    /// Whether the test was marked to run in parallel with its siblings
    pub parallel: bool,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Lines logged by the test body
    pub output: Vec<String>,
}

impl TestResult {
    pub fn pass(name: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Pass,
            parallel: false,
            started_at: Utc::now(),
            duration_ms,
            output: Vec::new(),
        }
    }

    pub fn fail(name: impl Into<String>, duration_ms: u64, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Fail,
            parallel: false,
            started_at: Utc::now(),
            duration_ms,
            output: vec![message.into()],
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Nesting depth, 0 for a top-level test
    pub fn depth(&self) -> usize {
        self.name.matches('/').count()
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.name,
            self.duration_ms
        )?;
        if let Some(line) = self.output.first() {
            write!(f, " - {line}")?;
        }
        Ok(())
    }
}

/// Summary of one run of a declaration tree
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Wall-clock duration of the whole run
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl RunSummary {
    pub fn new(results: Vec<TestResult>, duration_ms: u64) -> Self {
        let total = results.len();
        let passed = results
            .iter()
            .filter(|r| r.status == TestStatus::Pass)
            .count();

        Self {
            total,
            passed,
            failed: total - passed,
            duration_ms,
            results,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.passed == self.total
    }

    /// Process exit code matching the usual test binary convention
    pub fn exit_code(&self) -> i32 {
        if self.is_all_passed() {
            0
        } else {
            1
        }
    }

    /// Look up a result by its full name
    pub fn result(&self, name: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            writeln!(f, "  {result}")?;
        }
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {}",
            self.total, self.passed, self.failed
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.pass_rate(),
            self.duration_ms
        )
    }
}
