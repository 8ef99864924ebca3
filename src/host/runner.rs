//! Top-level test runner
//!
//! Runs a list of top-level declarations under a fresh root context and
//! collects the results of every test and subtest.

use std::io::{self, IsTerminal};

use anyhow::Result;
use tracing::info;

use super::context::{Shared, TestContext};
use crate::config::{self, EnvConfig, RunnerConfig};
use crate::executor;
use crate::models::{Declaration, RunSummary};
use crate::output::{OutputFormat, ResultFormatter};
use crate::utils::{init_logger, LogLevel, Timer};

/// Runs declaration trees as a test suite
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Build a runner from the config file and `PARTEST_*` environment
    /// variables, installing the logger on the way.
    pub fn from_env() -> Result<Self> {
        let env = EnvConfig::load();

        let mut config = match env.config_file.as_deref() {
            Some(path) => RunnerConfig::load(path)?,
            None => config::load_default()?,
        };
        config.apply_env(&env);
        config.validate()?;

        init_logger(LogLevel::from_str(&config.log_level).unwrap_or(LogLevel::Warn));

        Ok(Self::new(config))
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run top-level tests one after another.
    ///
    /// A top-level leaf runs its action directly and a top-level group runs
    /// its children in parallel. Top-level tests that mark themselves
    /// parallel run together once all of them have been started.
    pub fn run(&self, tests: &[Declaration]) -> RunSummary {
        let timer = Timer::start("test run");
        let shared = Shared::new(self.config.max_parallel);

        info!(
            "Running {} top-level tests (max {} parallel)",
            tests.len(),
            shared.slots.max()
        );

        shared.slots.acquire();
        TestContext::root(shared.clone()).execute(|root| {
            for test in tests {
                let declared = test.clone();
                root.run(test.name(), move |t| executor::invoke(t, &declared));
            }
        });
        shared.slots.release();

        let summary = RunSummary::new(shared.take_results(), timer.elapsed_ms());

        info!(
            "Test run completed in {}ms - Pass: {}/{} ({:.1}%)",
            summary.duration_ms,
            summary.passed,
            summary.total,
            summary.pass_rate()
        );

        summary
    }

    /// Run and print the report in the configured format
    pub fn run_and_report(&self, tests: &[Declaration]) -> RunSummary {
        let summary = self.run(tests);

        let formatter = self.report_formatter(io::stdout().is_terminal());
        println!("{}", formatter.format_summary(&summary));

        summary
    }

    /// Formatter for the configured report, colored only for a terminal
    fn report_formatter(&self, colorize: bool) -> ResultFormatter {
        let format = OutputFormat::from_str(&self.config.format).unwrap_or(OutputFormat::Text);
        let formatter = ResultFormatter::new(format).verbose(self.config.verbose);
        if colorize {
            formatter
        } else {
            formatter.no_color()
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

/// Run tests with the default configuration
pub fn run_tests(tests: &[Declaration]) -> RunSummary {
    Runner::default().run(tests)
}
