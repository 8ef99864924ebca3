//! Configuration file discovery

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::RunnerConfig;

/// Locations searched for a configuration file, in order
const CONFIG_LOCATIONS: &[&str] = &[
    "./partest.yaml",
    "./partest.yml",
    "./partest.json",
    "~/.config/partest/config.yaml",
];

/// Find a configuration file in the standard locations
pub fn find_config() -> Option<PathBuf> {
    CONFIG_LOCATIONS
        .iter()
        .map(|location| expand_path(location))
        .find(|path| path.exists())
}

/// Load configuration from the first standard location, or defaults
pub fn load_default() -> Result<RunnerConfig> {
    match find_config() {
        Some(path) => RunnerConfig::load(path),
        None => Ok(RunnerConfig::default()),
    }
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
pub(super) fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
