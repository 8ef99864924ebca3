//! Configuration module
//!
//! Handles loading and managing runner configuration.

mod env;
mod file;

pub use env::{EnvBuilder, EnvConfig, EnvGuard};
#[cfg(test)]
pub(crate) use env::ENV_LOCK;
pub use file::{find_config, load_default};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::output::OutputFormat;
use crate::utils::LogLevel;

/// Runner configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Maximum number of parallel test bodies running at once
    pub max_parallel: usize,

    /// Include the output of passing tests in reports
    pub verbose: bool,

    /// Log level for the `partest` target
    pub log_level: String,

    /// Report format (text, json, json-pretty, summary)
    pub format: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_parallelism(),
            verbose: false,
            log_level: "warn".to_string(),
            format: "text".to_string(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a JSON or YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if file::is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON or YAML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if file::is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_parallel == 0 {
            anyhow::bail!("max_parallel must be at least 1");
        }
        if LogLevel::from_str(&self.log_level).is_none() {
            anyhow::bail!("Unknown log level: {}", self.log_level);
        }
        if OutputFormat::from_str(&self.format).is_none() {
            anyhow::bail!("Unknown output format: {}", self.format);
        }
        Ok(())
    }

    /// Override fields with values set in the environment
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(max_parallel) = env.parallel {
            self.max_parallel = max_parallel;
        }
        if let Some(verbose) = env.verbose {
            self.verbose = verbose;
        }
        if let Some(level) = &env.log_level {
            self.log_level = level.clone();
        }
        if let Some(format) = &env.format {
            self.format = format.clone();
        }
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
