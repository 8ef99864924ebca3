//! Output formatters for test results
//!
//! Provides text, JSON, and one-line summary output formats.

use std::io::Write;

use crate::models::{RunSummary, TestResult, TestStatus};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    JsonPretty,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
    verbose: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
            verbose: false,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Also report passing tests and their output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Format a single test result
    pub fn format_result(&self, result: &TestResult) -> String {
        match self.format {
            OutputFormat::Text => self.format_result_text(result),
            OutputFormat::Json => serde_json::to_string(result).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Summary => format!(
                "{} {} ({}ms)",
                result.status.symbol(),
                result.name,
                result.duration_ms
            ),
        }
    }

    fn format_result_text(&self, result: &TestResult) -> String {
        let indent = "    ".repeat(result.depth());
        let status = match (result.status, self.colorize) {
            (TestStatus::Pass, true) => "\x1b[32mPASS\x1b[0m",
            (TestStatus::Fail, true) => "\x1b[31mFAIL\x1b[0m",
            (TestStatus::Pass, false) => "PASS",
            (TestStatus::Fail, false) => "FAIL",
        };

        let mut output = format!(
            "{indent}--- {status}: {} ({:.2}s)",
            result.name,
            result.duration_ms as f64 / 1000.0
        );
        for line in &result.output {
            output.push_str(&format!("\n{indent}    {line}"));
        }
        output
    }

    /// Format a whole run
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Text => self.format_summary_text(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Summary => self.format_summary_brief(summary),
        }
    }

    fn format_summary_text(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        for result in &summary.results {
            if self.verbose || !result.status.is_success() {
                output.push_str(&self.format_result_text(result));
                output.push('\n');
            }
        }

        let verdict = if summary.is_all_passed() { "ok" } else { "FAIL" };
        output.push_str(&format!(
            "{verdict}\t{}/{} passed in {:.2}s",
            summary.passed,
            summary.total,
            summary.duration_ms as f64 / 1000.0
        ));
        output
    }

    fn format_summary_brief(&self, summary: &RunSummary) -> String {
        format!(
            "{}/{} passed ({:.1}%), {} failed in {}ms",
            summary.passed,
            summary.total,
            summary.pass_rate(),
            summary.failed,
            summary.duration_ms
        )
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Text)
    }
}

/// Write a report to a file
pub fn write_results_to_file(
    path: &str,
    summary: &RunSummary,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let formatter = ResultFormatter::new(format).no_color().verbose(true);
    let content = formatter.format_summary(summary);

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}
