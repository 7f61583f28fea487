//! Analyzer configuration

use serde::Deserialize;
use std::time::Duration;

use crate::analyzer::{PodAnalyzer, DEFAULT_UNSCHEDULABLE_THRESHOLD};
use crate::error::Result;

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalyzerConfig {
    /// Seconds a pod must stay unschedulable before it is counted
    #[serde(default = "default_unschedulable_threshold_secs")]
    pub unschedulable_threshold_secs: u64,
}

fn default_unschedulable_threshold_secs() -> u64 {
    DEFAULT_UNSCHEDULABLE_THRESHOLD.as_secs()
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            unschedulable_threshold_secs: default_unschedulable_threshold_secs(),
        }
    }
}

impl AnalyzerConfig {
    pub fn unschedulable_threshold(&self) -> Duration {
        Duration::from_secs(self.unschedulable_threshold_secs)
    }

    /// Build the analyzer described by this configuration
    pub fn analyzer(&self) -> Result<PodAnalyzer> {
        PodAnalyzer::with_threshold(self.unschedulable_threshold())
    }
}
