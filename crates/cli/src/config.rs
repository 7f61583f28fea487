//! Configuration loading for the CLI

use anyhow::{Context, Result};
use podhealth_lib::AnalyzerConfig;
use std::path::PathBuf;

/// Environment variable prefix, e.g. `PODHEALTH_UNSCHEDULABLE_THRESHOLD_SECS`
const ENV_PREFIX: &str = "PODHEALTH";

/// Load analyzer configuration from the config file and environment
///
/// The config file is optional. Environment variables override it, and
/// `threshold_override` (from the command line) overrides both.
pub fn load(threshold_override: Option<u64>) -> Result<AnalyzerConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = config_path() {
        builder = builder.add_source(config::File::from(path).required(false));
    }

    let settings = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()
        .context("Failed to load configuration")?;

    let mut config: AnalyzerConfig = settings
        .try_deserialize()
        .context("Failed to parse configuration")?;

    if let Some(secs) = threshold_override {
        config.unschedulable_threshold_secs = secs;
    }

    Ok(config)
}

/// Get the configuration file path
fn config_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("podhealth").join("config.json"))
}
