//! Pod health analysis for federated workloads
//!
//! This crate provides:
//! - Typed pod observations built from Kubernetes API pods
//! - Debounced classification of a workload's pods with a recheck signal
//! - Per-cluster status records for federated resources
//! - Metrics and structured logging of analysis outcomes

pub mod analyzer;
pub mod config;
pub mod error;
pub mod federated;
pub mod models;
pub mod observability;

pub use analyzer::{
    analyze_pods, PodAnalysisResult, PodAnalyzer, PodHealth, ReconciliationStatus,
    DEFAULT_UNSCHEDULABLE_THRESHOLD,
};
pub use config::AnalyzerConfig;
pub use error::{Error, Result};
pub use federated::{FederatedResource, ResourceClusterStatus};
pub use models::*;
pub use observability::{AnalyzerMetrics, StructuredLogger};
