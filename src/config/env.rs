//! Environment variable configuration
//!
//! Provides environment variable overrides for runner configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "PARTEST";

/// Held by tests that set or read `PARTEST_*` variables
#[cfg(test)]
pub(crate) static ENV_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

/// Configuration read from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Maximum parallel bodies from PARTEST_PARALLEL
    pub parallel: Option<usize>,
    /// Verbose reports from PARTEST_VERBOSE
    pub verbose: Option<bool>,
    /// Log level from PARTEST_LOG
    pub log_level: Option<String>,
    /// Report format from PARTEST_FORMAT
    pub format: Option<String>,
    /// Config file from PARTEST_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            parallel: get_env_parse("PARALLEL"),
            verbose: get_env_bool("VERBOSE"),
            log_level: get_env("LOG"),
            format: get_env("FORMAT"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.parallel.is_some()
            || self.verbose.is_some()
            || self.log_level.is_some()
            || self.format.is_some()
            || self.config_file.is_some()
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn parallel(mut self, max_parallel: usize) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_PARALLEL"), max_parallel.to_string()));
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_VERBOSE"), verbose.to_string()));
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_LOG"), level.into()));
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_FORMAT"), format.into()));
        self
    }

    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_CONFIG"), path.into()));
        self
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}
