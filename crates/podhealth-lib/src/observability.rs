//! Observability for pod health analysis
//!
//! Provides:
//! - Prometheus metrics (per-cluster pod counts, analysis and recheck totals)
//! - Structured logging of analysis outcomes with tracing
//!
//! The analyzer itself never logs or records; callers report outcomes here.

use prometheus::{
    register_int_counter, register_int_gauge_vec, Encoder, IntCounter, IntGaugeVec, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::analyzer::{PodAnalysisResult, ReconciliationStatus};
use crate::error::Result;

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AnalyzerMetricsInner> = OnceLock::new();

struct AnalyzerMetricsInner {
    pods_total: IntGaugeVec,
    pods_running_ready: IntGaugeVec,
    pods_unschedulable: IntGaugeVec,
    analyses: IntCounter,
    rechecks: IntCounter,
}

impl AnalyzerMetricsInner {
    fn new() -> Self {
        Self {
            pods_total: register_int_gauge_vec!(
                "podhealth_pods_total",
                "Number of pods observed in the last analysis",
                &["cluster"]
            )
            .expect("Failed to register pods_total"),

            pods_running_ready: register_int_gauge_vec!(
                "podhealth_pods_running_ready",
                "Number of running and ready pods in the last analysis",
                &["cluster"]
            )
            .expect("Failed to register pods_running_ready"),

            pods_unschedulable: register_int_gauge_vec!(
                "podhealth_pods_unschedulable",
                "Number of pods unschedulable past the threshold in the last analysis",
                &["cluster"]
            )
            .expect("Failed to register pods_unschedulable"),

            analyses: register_int_counter!(
                "podhealth_analyses_total",
                "Total number of pod analyses performed"
            )
            .expect("Failed to register analyses_total"),

            rechecks: register_int_counter!(
                "podhealth_rechecks_total",
                "Total number of analyses that asked for a recheck"
            )
            .expect("Failed to register rechecks_total"),
        }
    }
}

/// Lightweight handle to the global analyzer metrics
#[derive(Clone)]
pub struct AnalyzerMetrics {
    _private: (),
}

impl Default for AnalyzerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AnalyzerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AnalyzerMetricsInner {
        GLOBAL_METRICS.get_or_init(AnalyzerMetricsInner::new)
    }

    /// Record the outcome of one analysis for a cluster
    pub fn record(&self, cluster: &str, result: &PodAnalysisResult, status: ReconciliationStatus) {
        let inner = self.inner();
        inner
            .pods_total
            .with_label_values(&[cluster])
            .set(result.total as i64);
        inner
            .pods_running_ready
            .with_label_values(&[cluster])
            .set(result.running_and_ready as i64);
        inner
            .pods_unschedulable
            .with_label_values(&[cluster])
            .set(result.unschedulable as i64);
        inner.analyses.inc();
        if status.needs_recheck() {
            inner.rechecks.inc();
        }
    }

    /// Render the default registry in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Structured logger for analysis events
#[derive(Clone)]
pub struct StructuredLogger {
    workload: String,
}

impl StructuredLogger {
    pub fn new(workload: impl Into<String>) -> Self {
        Self {
            workload: workload.into(),
        }
    }

    /// Log the outcome of an analysis
    ///
    /// A recheck is an instruction to the caller, not a fault, so it is
    /// logged at the same level as a settled result.
    pub fn log_analysis(&self, cluster: &str, result: &PodAnalysisResult, status: ReconciliationStatus) {
        info!(
            event = "pods_analyzed",
            workload = %self.workload,
            cluster = %cluster,
            total = result.total,
            running_and_ready = result.running_and_ready,
            unschedulable = result.unschedulable,
            status = %status,
            "Analyzed workload pods"
        );
    }

    /// Log that the caller will reconcile again after `requeue_after_secs`
    pub fn log_recheck(&self, cluster: &str, requeue_after_secs: u64) {
        debug!(
            event = "recheck_scheduled",
            workload = %self.workload,
            cluster = %cluster,
            requeue_after_secs = requeue_after_secs,
            "Unschedulable pods inside debounce window, recheck requested"
        );
    }
}
